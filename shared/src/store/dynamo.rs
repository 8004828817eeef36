//! DynamoDB single-table implementation of the store traits.
//!
//! | item          | PK              | SK              | GSI1PK            | GSI1SK        |
//! |---------------|-----------------|-----------------|-------------------|---------------|
//! | event         | `EVENT#<id>`    | `META`          | `OWNER#<owner>`   | `EVENT#<id>`  |
//! | guest         | `EVENT#<id>`    | `GUEST#<gid>`   |                   |               |
//! | guest index   | `GUEST#<gid>`   | `INDEX`         |                   |               |
//! | template      | `EVENT#<id>`    | `TEMPLATE`      |                   |               |
//! | allowed user  | `EVENT#<id>`    | `ALLOWED#<uid>` | `ALLOWED#<uid>`   | `EVENT#<id>`  |
//! | user account  | `USER#<uid>`    | `PROFILE`       | `EMAIL#<email>`   | `USER#<uid>`  |
//! | task          | `EVENT#<id>`    | `TASK#<tid>`    |                   |               |
//! | expense       | `EVENT#<id>`    | `EXPENSE#<xid>` |                   |               |
//! | inspiration   | `EVENT#<id>`    | `INSPIRATION#<iid>` |               |               |
//!
//! Record payloads sit under a `data` attribute. Queries on the table itself
//! are strongly consistent, so a read after a write sees it.

use std::collections::HashMap;

use async_trait::async_trait;
use aws_sdk_dynamodb::types::{AttributeValue, Delete, Put, TransactWriteItem};
use aws_sdk_dynamodb::Client;
use log::{debug, error, info};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use serde_json::Value;

use super::{
    AccessStore, EventStore, ExpenseStore, GuestStore, InspirationStore, StoreError, TaskStore,
    TemplateStore,
};
use crate::invite::InviteTemplate;
use crate::models::{AllowedUser, Event, Expense, Guest, Inspiration, Task, UserAccount};

const GSI1: &str = "GSI1";
const TASK: &str = "TASK#";
const EXPENSE: &str = "EXPENSE#";
const INSPIRATION: &str = "INSPIRATION#";
type Item = HashMap<String, AttributeValue>;

#[derive(Serialize, Deserialize, Debug)]
struct Record<T> {
    #[serde(rename = "PK")]
    pk: String,
    #[serde(rename = "SK")]
    sk: String,
    #[serde(rename = "GSI1PK", default, skip_serializing_if = "Option::is_none")]
    gsi1pk: Option<String>,
    #[serde(rename = "GSI1SK", default, skip_serializing_if = "Option::is_none")]
    gsi1sk: Option<String>,
    data: T,
}

#[derive(Serialize, Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
struct GuestIndexEntry {
    event_id: String,
}

fn event_pk(id: &str) -> String {
    format!("EVENT#{}", id)
}

fn backend(context: &str) -> impl Fn(String) -> StoreError + '_ {
    move |e| {
        error!("DynamoDB {} failed: {}", context, e);
        StoreError::Backend(format!("{}: {}", context, e))
    }
}

/// DynamoDB-backed store
pub struct DynamoStore {
    client: Client,
    table_name: String,
}

impl DynamoStore {
    /// Builds a client from the ambient AWS configuration
    pub async fn new(table_name: String) -> Self {
        let config = aws_config::defaults(aws_config::BehaviorVersion::latest())
            .load()
            .await;
        info!("Using DynamoDB table '{}'", table_name);
        Self::with_client_and_table(Client::new(&config), table_name)
    }

    pub fn with_client_and_table(client: Client, table_name: String) -> Self {
        Self { client, table_name }
    }

    fn to_item<T: Serialize>(record: &Record<T>) -> Result<Item, StoreError> {
        serde_dynamo::to_item(record).map_err(|e| StoreError::Serialization(e.to_string()))
    }

    fn from_item<T: DeserializeOwned>(item: Item) -> Result<T, StoreError> {
        serde_dynamo::from_item::<_, Record<T>>(item)
            .map(|r| r.data)
            .map_err(|e| StoreError::Serialization(e.to_string()))
    }

    async fn put<T: Serialize + Sync>(&self, record: &Record<T>) -> Result<(), StoreError> {
        self.client
            .put_item()
            .table_name(&self.table_name)
            .set_item(Some(Self::to_item(record)?))
            .send()
            .await
            .map_err(|e| e.to_string())
            .map_err(backend("put_item"))?;
        Ok(())
    }

    async fn get<T: DeserializeOwned>(&self, pk: &str, sk: &str) -> Result<Option<T>, StoreError> {
        let output = self
            .client
            .get_item()
            .table_name(&self.table_name)
            .key("PK", AttributeValue::S(pk.to_string()))
            .key("SK", AttributeValue::S(sk.to_string()))
            .send()
            .await
            .map_err(|e| e.to_string())
            .map_err(backend("get_item"))?;

        output.item.map(Self::from_item).transpose()
    }

    async fn delete(&self, pk: &str, sk: &str) -> Result<(), StoreError> {
        self.client
            .delete_item()
            .table_name(&self.table_name)
            .key("PK", AttributeValue::S(pk.to_string()))
            .key("SK", AttributeValue::S(sk.to_string()))
            .send()
            .await
            .map_err(|e| e.to_string())
            .map_err(backend("delete_item"))?;
        Ok(())
    }

    /// Queries the table (or GSI1 when `index` is set) for items under `pk`
    /// whose sort key starts with `prefix`, following pagination.
    async fn query_prefix(
        &self,
        index: Option<&str>,
        pk: &str,
        prefix: &str,
    ) -> Result<Vec<Item>, StoreError> {
        let (pk_name, sk_name) = match index {
            Some(_) => ("GSI1PK", "GSI1SK"),
            None => ("PK", "SK"),
        };

        let mut items = Vec::new();
        let mut start_key: Option<Item> = None;
        loop {
            let output = self
                .client
                .query()
                .table_name(&self.table_name)
                .set_index_name(index.map(str::to_string))
                .set_consistent_read(index.is_none().then_some(true))
                .key_condition_expression("#pk = :pk AND begins_with(#sk, :prefix)")
                .expression_attribute_names("#pk", pk_name)
                .expression_attribute_names("#sk", sk_name)
                .expression_attribute_values(":pk", AttributeValue::S(pk.to_string()))
                .expression_attribute_values(":prefix", AttributeValue::S(prefix.to_string()))
                .set_exclusive_start_key(start_key.take())
                .send()
                .await
                .map_err(|e| e.to_string())
                .map_err(backend("query"))?;

            items.extend(output.items.unwrap_or_default());
            match output.last_evaluated_key {
                Some(key) if !key.is_empty() => start_key = Some(key),
                _ => break,
            }
        }
        debug!("Query {} / {}* returned {} items", pk, prefix, items.len());
        Ok(items)
    }

    async fn transact(&self, items: Vec<TransactWriteItem>) -> Result<(), StoreError> {
        self.client
            .transact_write_items()
            .set_transact_items(Some(items))
            .send()
            .await
            .map_err(|e| e.to_string())
            .map_err(backend("transact_write_items"))?;
        Ok(())
    }

    fn put_op<T: Serialize>(&self, record: &Record<T>) -> Result<TransactWriteItem, StoreError> {
        let put = Put::builder()
            .table_name(&self.table_name)
            .set_item(Some(Self::to_item(record)?))
            .build()
            .map_err(|e| StoreError::Backend(e.to_string()))?;
        Ok(TransactWriteItem::builder().put(put).build())
    }

    fn delete_op(&self, pk: String, sk: String) -> Result<TransactWriteItem, StoreError> {
        let delete = Delete::builder()
            .table_name(&self.table_name)
            .key("PK", AttributeValue::S(pk))
            .key("SK", AttributeValue::S(sk))
            .build()
            .map_err(|e| StoreError::Backend(e.to_string()))?;
        Ok(TransactWriteItem::builder().delete(delete).build())
    }

    async fn put_child<T: Serialize + Sync>(
        &self,
        event_id: &str,
        prefix: &str,
        id: &str,
        data: &T,
    ) -> Result<(), StoreError> {
        self.put(&Record {
            pk: event_pk(event_id),
            sk: format!("{}{}", prefix, id),
            gsi1pk: None,
            gsi1sk: None,
            data,
        })
        .await
    }

    async fn get_child<T: DeserializeOwned>(
        &self,
        event_id: &str,
        prefix: &str,
        id: &str,
    ) -> Result<T, StoreError> {
        self.get(&event_pk(event_id), &format!("{}{}", prefix, id))
            .await?
            .ok_or_else(|| {
                let what = prefix.trim_end_matches('#').to_lowercase();
                StoreError::NotFound(format!("{} {}", what, id))
            })
    }

    async fn get_children<T: DeserializeOwned>(
        &self,
        event_id: &str,
        prefix: &str,
    ) -> Result<Vec<T>, StoreError> {
        self.query_prefix(None, &event_pk(event_id), prefix)
            .await?
            .into_iter()
            .map(Self::from_item)
            .collect()
    }

    /// Deletes every item under the event whose sort key starts with `prefix`
    async fn delete_children(&self, event_id: &str, prefix: &str) -> Result<(), StoreError> {
        let pk = event_pk(event_id);
        for item in self.query_prefix(None, &pk, prefix).await? {
            if let Some(AttributeValue::S(sk)) = item.get("SK") {
                self.delete(&pk, sk).await?;
            }
        }
        Ok(())
    }
}

fn event_record(event: &Event) -> Record<&Event> {
    Record {
        pk: event_pk(&event.id),
        sk: "META".into(),
        gsi1pk: Some(format!("OWNER#{}", event.owner_id)),
        gsi1sk: Some(event_pk(&event.id)),
        data: event,
    }
}

fn guest_records(guest: &Guest) -> (Record<&Guest>, Record<GuestIndexEntry>) {
    (
        Record {
            pk: event_pk(&guest.event_id),
            sk: format!("GUEST#{}", guest.id),
            gsi1pk: None,
            gsi1sk: None,
            data: guest,
        },
        Record {
            pk: format!("GUEST#{}", guest.id),
            sk: "INDEX".into(),
            gsi1pk: None,
            gsi1sk: None,
            data: GuestIndexEntry {
                event_id: guest.event_id.clone(),
            },
        },
    )
}

#[async_trait]
impl EventStore for DynamoStore {
    async fn create_event(&self, event: Event) -> Result<Event, StoreError> {
        self.put(&event_record(&event)).await?;
        Ok(event)
    }

    async fn get_event(&self, id: &str) -> Result<Event, StoreError> {
        self.get(&event_pk(id), "META")
            .await?
            .ok_or_else(|| StoreError::NotFound(format!("Event {}", id)))
    }

    async fn get_events_by_owner(&self, owner_id: &str) -> Result<Vec<Event>, StoreError> {
        self.query_prefix(Some(GSI1), &format!("OWNER#{}", owner_id), "EVENT#")
            .await?
            .into_iter()
            .map(Self::from_item)
            .collect()
    }

    async fn get_events_shared_with(&self, user_id: &str) -> Result<Vec<Event>, StoreError> {
        let grants = self
            .query_prefix(Some(GSI1), &format!("ALLOWED#{}", user_id), "EVENT#")
            .await?;

        let mut events = Vec::with_capacity(grants.len());
        for item in grants {
            let Some(AttributeValue::S(pk)) = item.get("PK") else {
                continue;
            };
            let event_id = pk.trim_start_matches("EVENT#");
            match self.get_event(event_id).await {
                Ok(event) => events.push(event),
                // Grant outlived its event
                Err(StoreError::NotFound(_)) => continue,
                Err(e) => return Err(e),
            }
        }
        Ok(events)
    }

    async fn delete_event(&self, id: &str) -> Result<(), StoreError> {
        let pk = event_pk(id);
        for guest in self.get_guests(id).await? {
            self.delete_guest(id, &guest.id).await?;
        }
        for prefix in ["ALLOWED#", TASK, EXPENSE, INSPIRATION] {
            self.delete_children(id, prefix).await?;
        }
        self.delete(&pk, "TEMPLATE").await?;
        self.delete(&pk, "META").await
    }
}

#[async_trait]
impl GuestStore for DynamoStore {
    async fn add_guest(&self, guest: Guest) -> Result<Guest, StoreError> {
        let (record, index) = guest_records(&guest);
        self.transact(vec![self.put_op(&record)?, self.put_op(&index)?])
            .await?;
        Ok(guest)
    }

    async fn update_guest(&self, guest: Guest) -> Result<Guest, StoreError> {
        // Make sure it exists so an update never creates a dangling guest
        self.get_guest(&guest.event_id, &guest.id).await?;
        let (record, _) = guest_records(&guest);
        self.put(&record).await?;
        Ok(guest)
    }

    async fn get_guest(&self, event_id: &str, guest_id: &str) -> Result<Guest, StoreError> {
        self.get(&event_pk(event_id), &format!("GUEST#{}", guest_id))
            .await?
            .ok_or_else(|| StoreError::NotFound(format!("Guest {}", guest_id)))
    }

    async fn get_guests(&self, event_id: &str) -> Result<Vec<Guest>, StoreError> {
        let mut guests: Vec<Guest> = self
            .query_prefix(None, &event_pk(event_id), "GUEST#")
            .await?
            .into_iter()
            .map(Self::from_item)
            .collect::<Result<_, _>>()?;
        guests.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(guests)
    }

    async fn delete_guest(&self, event_id: &str, guest_id: &str) -> Result<(), StoreError> {
        self.transact(vec![
            self.delete_op(event_pk(event_id), format!("GUEST#{}", guest_id))?,
            self.delete_op(format!("GUEST#{}", guest_id), "INDEX".into())?,
        ])
        .await
    }

    async fn find_guest_event(&self, guest_id: &str) -> Result<Option<String>, StoreError> {
        Ok(self
            .get::<GuestIndexEntry>(&format!("GUEST#{}", guest_id), "INDEX")
            .await?
            .map(|entry| entry.event_id))
    }
}

#[async_trait]
impl TemplateStore for DynamoStore {
    async fn get_template(&self, event_id: &str) -> Result<Option<Value>, StoreError> {
        self.get(&event_pk(event_id), "TEMPLATE").await
    }

    async fn put_template(
        &self,
        event_id: &str,
        template: &InviteTemplate,
    ) -> Result<(), StoreError> {
        self.put(&Record {
            pk: event_pk(event_id),
            sk: "TEMPLATE".into(),
            gsi1pk: None,
            gsi1sk: None,
            data: template,
        })
        .await
    }

    async fn list_template_event_ids(&self) -> Result<Vec<String>, StoreError> {
        let mut ids = Vec::new();
        let mut start_key: Option<Item> = None;
        loop {
            let output = self
                .client
                .scan()
                .table_name(&self.table_name)
                .filter_expression("SK = :sk")
                .expression_attribute_values(":sk", AttributeValue::S("TEMPLATE".into()))
                .projection_expression("PK")
                .set_exclusive_start_key(start_key.take())
                .send()
                .await
                .map_err(|e| e.to_string())
                .map_err(backend("scan"))?;

            for item in output.items.unwrap_or_default() {
                if let Some(AttributeValue::S(pk)) = item.get("PK") {
                    ids.push(pk.trim_start_matches("EVENT#").to_string());
                }
            }
            match output.last_evaluated_key {
                Some(key) if !key.is_empty() => start_key = Some(key),
                _ => break,
            }
        }
        Ok(ids)
    }
}

#[async_trait]
impl AccessStore for DynamoStore {
    async fn get_allowed_users(&self, event_id: &str) -> Result<Vec<AllowedUser>, StoreError> {
        self.query_prefix(None, &event_pk(event_id), "ALLOWED#")
            .await?
            .into_iter()
            .map(Self::from_item)
            .collect()
    }

    async fn is_allowed(&self, event_id: &str, user_id: &str) -> Result<bool, StoreError> {
        Ok(self
            .get::<AllowedUser>(&event_pk(event_id), &format!("ALLOWED#{}", user_id))
            .await?
            .is_some())
    }

    async fn put_allowed_user(&self, event_id: &str, user: AllowedUser) -> Result<(), StoreError> {
        self.put(&Record {
            pk: event_pk(event_id),
            sk: format!("ALLOWED#{}", user.uid),
            gsi1pk: Some(format!("ALLOWED#{}", user.uid)),
            gsi1sk: Some(event_pk(event_id)),
            data: &user,
        })
        .await
    }

    async fn delete_allowed_user(&self, event_id: &str, user_id: &str) -> Result<(), StoreError> {
        self.delete(&event_pk(event_id), &format!("ALLOWED#{}", user_id))
            .await
    }

    async fn find_user_by_email(&self, email: &str) -> Result<Option<UserAccount>, StoreError> {
        let mut items = self
            .query_prefix(Some(GSI1), &format!("EMAIL#{}", email.trim()), "USER#")
            .await?;
        if items.is_empty() {
            return Ok(None);
        }
        Self::from_item(items.swap_remove(0)).map(Some)
    }
}

#[async_trait]
impl TaskStore for DynamoStore {
    async fn put_task(&self, task: Task) -> Result<Task, StoreError> {
        self.put_child(&task.event_id, TASK, &task.id, &task).await?;
        Ok(task)
    }

    async fn get_task(&self, event_id: &str, task_id: &str) -> Result<Task, StoreError> {
        self.get_child(event_id, TASK, task_id).await
    }

    async fn get_tasks(&self, event_id: &str) -> Result<Vec<Task>, StoreError> {
        let mut tasks: Vec<Task> = self.get_children(event_id, TASK).await?;
        tasks.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(tasks)
    }

    async fn delete_task(&self, event_id: &str, task_id: &str) -> Result<(), StoreError> {
        self.delete(&event_pk(event_id), &format!("{}{}", TASK, task_id))
            .await
    }
}

#[async_trait]
impl ExpenseStore for DynamoStore {
    async fn put_expense(&self, expense: Expense) -> Result<Expense, StoreError> {
        self.put_child(&expense.event_id, EXPENSE, &expense.id, &expense)
            .await?;
        Ok(expense)
    }

    async fn get_expense(&self, event_id: &str, expense_id: &str) -> Result<Expense, StoreError> {
        self.get_child(event_id, EXPENSE, expense_id).await
    }

    async fn get_expenses(&self, event_id: &str) -> Result<Vec<Expense>, StoreError> {
        let mut expenses: Vec<Expense> = self.get_children(event_id, EXPENSE).await?;
        expenses.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(expenses)
    }

    async fn delete_expense(&self, event_id: &str, expense_id: &str) -> Result<(), StoreError> {
        self.delete(&event_pk(event_id), &format!("{}{}", EXPENSE, expense_id))
            .await
    }
}

#[async_trait]
impl InspirationStore for DynamoStore {
    async fn add_inspiration(&self, inspiration: Inspiration) -> Result<Inspiration, StoreError> {
        self.put_child(&inspiration.event_id, INSPIRATION, &inspiration.id, &inspiration)
            .await?;
        Ok(inspiration)
    }

    async fn get_inspirations(&self, event_id: &str) -> Result<Vec<Inspiration>, StoreError> {
        let mut photos: Vec<Inspiration> = self.get_children(event_id, INSPIRATION).await?;
        photos.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(photos)
    }

    async fn delete_inspiration(
        &self,
        event_id: &str,
        inspiration_id: &str,
    ) -> Result<(), StoreError> {
        self.delete(&event_pk(event_id), &format!("{}{}", INSPIRATION, inspiration_id))
            .await
    }
}
