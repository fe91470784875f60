//! DynamoDB backend.
//!
//! The record is a single item: `{ <key_attribute>: S(record_key), <value_attribute>: S(value) }`.
//! `PutItem` replaces the whole item, which gives upsert semantics with last write winning.

use std::collections::HashMap;

use async_trait::async_trait;
use aws_config::BehaviorVersion;
use aws_sdk_dynamodb::{config::Region, error::DisplayErrorContext, types::AttributeValue, Client};
use configs::StoreConfig;
use tracing::debug;

use super::StringStore;
use crate::errors::ServiceError;

#[derive(Clone, Debug)]
pub struct DynamoStringStore {
    client: Client,
    table_name: String,
    key_attribute: String,
    value_attribute: String,
}

impl DynamoStringStore {
    pub fn new(client: Client, cfg: &StoreConfig) -> Self {
        Self {
            client,
            table_name: cfg.table_name.clone(),
            key_attribute: cfg.key_attribute.clone(),
            value_attribute: cfg.value_attribute.clone(),
        }
    }

    /// Build a client from the ambient AWS environment (credentials chain, region),
    /// honouring the optional region and endpoint overrides from config.
    pub async fn from_config(cfg: &StoreConfig) -> Self {
        let mut loader = aws_config::defaults(BehaviorVersion::latest());
        if let Some(region) = &cfg.region {
            loader = loader.region(Region::new(region.clone()));
        }
        let shared = loader.load().await;

        let mut builder = aws_sdk_dynamodb::config::Builder::from(&shared);
        if let Some(endpoint) = &cfg.endpoint_url {
            // DynamoDB Local / LocalStack
            builder = builder.endpoint_url(endpoint);
        }
        Self::new(Client::from_conf(builder.build()), cfg)
    }

    fn key(&self, key: &str) -> (String, AttributeValue) {
        (self.key_attribute.clone(), AttributeValue::S(key.to_string()))
    }
}

/// Pull the string value out of a `GetItem` result.
///
/// No item means nothing was ever written. An item without a string value
/// attribute was written by someone else and is reported as a store fault.
fn value_from_item(
    item: Option<&HashMap<String, AttributeValue>>,
    value_attribute: &str,
) -> Result<Option<String>, ServiceError> {
    let Some(item) = item else { return Ok(None) };
    match item.get(value_attribute) {
        Some(AttributeValue::S(value)) => Ok(Some(value.clone())),
        Some(other) => Err(ServiceError::Store(format!(
            "attribute `{value_attribute}` is not a string: {other:?}"
        ))),
        None => Err(ServiceError::Store(format!("record has no `{value_attribute}` attribute"))),
    }
}

#[async_trait]
impl StringStore for DynamoStringStore {
    async fn get(&self, key: &str) -> Result<Option<String>, ServiceError> {
        let (key_name, key_value) = self.key(key);
        let output = self
            .client
            .get_item()
            .table_name(&self.table_name)
            .key(key_name, key_value)
            .send()
            .await
            .map_err(|e| ServiceError::Store(DisplayErrorContext(e).to_string()))?;
        debug!(table = %self.table_name, key, found = output.item().is_some(), "dynamodb get_item");
        value_from_item(output.item(), &self.value_attribute)
    }

    async fn put(&self, key: &str, value: &str) -> Result<(), ServiceError> {
        let (key_name, key_value) = self.key(key);
        self.client
            .put_item()
            .table_name(&self.table_name)
            .item(key_name, key_value)
            .item(&self.value_attribute, AttributeValue::S(value.to_string()))
            .send()
            .await
            .map_err(|e| ServiceError::Store(DisplayErrorContext(e).to_string()))?;
        debug!(table = %self.table_name, key, len = value.len(), "dynamodb put_item");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use aws_sdk_dynamodb::operation::{
        get_item::{GetItemError, GetItemOutput},
        put_item::PutItemOutput,
    };
    use aws_sdk_dynamodb::types::error::ProvisionedThroughputExceededException;
    use aws_smithy_mocks::{mock, mock_client};

    fn item(pairs: &[(&str, AttributeValue)]) -> HashMap<String, AttributeValue> {
        pairs.iter().map(|(k, v)| (k.to_string(), v.clone())).collect()
    }

    #[test]
    fn missing_item_means_never_written() {
        assert!(matches!(value_from_item(None, "string-value"), Ok(None)));
    }

    #[test]
    fn string_attribute_is_extracted() {
        let it = item(&[
            ("string-key", AttributeValue::S("main".into())),
            ("string-value", AttributeValue::S("<i>hi</i>".into())),
        ]);
        let value = value_from_item(Some(&it), "string-value").unwrap();
        assert_eq!(value.as_deref(), Some("<i>hi</i>"));
    }

    #[test]
    fn empty_string_is_a_value() {
        let it = item(&[("string-value", AttributeValue::S(String::new()))]);
        assert_eq!(value_from_item(Some(&it), "string-value").unwrap(), Some(String::new()));
    }

    #[test]
    fn wrong_type_or_missing_attribute_is_store_error() {
        let it = item(&[("string-value", AttributeValue::N("42".into()))]);
        assert!(matches!(value_from_item(Some(&it), "string-value"), Err(ServiceError::Store(_))));

        let it = item(&[("string-key", AttributeValue::S("main".into()))]);
        assert!(matches!(value_from_item(Some(&it), "string-value"), Err(ServiceError::Store(_))));
    }

    fn default_store(client: Client) -> DynamoStringStore {
        DynamoStringStore::new(client, &StoreConfig::default())
    }

    fn is_main_key(key: Option<&HashMap<String, AttributeValue>>) -> bool {
        key.map(|k| k.len() == 1 && k.get("string-key") == Some(&AttributeValue::S("main".into())))
            .unwrap_or(false)
    }

    #[tokio::test]
    async fn put_sends_single_item_to_configured_table() -> Result<(), anyhow::Error> {
        let rule = mock!(Client::put_item)
            .match_requests(|req| {
                req.table_name() == Some("string-table")
                    && req
                        .item()
                        .map(|item| {
                            item.len() == 2
                                && item.get("string-key") == Some(&AttributeValue::S("main".into()))
                                && item.get("string-value") == Some(&AttributeValue::S("hello".into()))
                        })
                        .unwrap_or(false)
            })
            .then_output(|| PutItemOutput::builder().build());
        let store = default_store(mock_client!(aws_sdk_dynamodb, [&rule]));

        store.put("main", "hello").await?;
        assert_eq!(rule.num_calls(), 1);
        Ok(())
    }

    #[tokio::test]
    async fn get_without_item_is_none() -> Result<(), anyhow::Error> {
        let rule = mock!(Client::get_item)
            .match_requests(|req| req.table_name() == Some("string-table") && is_main_key(req.key()))
            .then_output(|| GetItemOutput::builder().build());
        let store = default_store(mock_client!(aws_sdk_dynamodb, [&rule]));

        assert_eq!(store.get("main").await?, None);
        assert_eq!(rule.num_calls(), 1);
        Ok(())
    }

    #[tokio::test]
    async fn get_returns_stored_value() -> Result<(), anyhow::Error> {
        let rule = mock!(Client::get_item)
            .match_requests(|req| req.table_name() == Some("string-table") && is_main_key(req.key()))
            .then_output(|| {
                GetItemOutput::builder()
                    .item("string-key", AttributeValue::S("main".into()))
                    .item("string-value", AttributeValue::S("<b>saved</b>".into()))
                    .build()
            });
        let store = default_store(mock_client!(aws_sdk_dynamodb, [&rule]));

        assert_eq!(store.get("main").await?.as_deref(), Some("<b>saved</b>"));
        assert_eq!(rule.num_calls(), 1);
        Ok(())
    }

    #[tokio::test]
    async fn throttling_is_a_store_error() {
        let rule = mock!(Client::get_item).then_error(|| {
            GetItemError::ProvisionedThroughputExceededException(
                ProvisionedThroughputExceededException::builder().message("slow down").build(),
            )
        });
        let store = default_store(mock_client!(aws_sdk_dynamodb, [&rule]));

        assert!(matches!(store.get("main").await, Err(ServiceError::Store(_))));
    }

    #[tokio::test]
    async fn from_config_applies_overrides() {
        let cfg = StoreConfig {
            region: Some("eu-west-1".into()),
            endpoint_url: Some("http://localhost:8000".into()),
            table_name: "t".into(),
            ..StoreConfig::default()
        };
        let store = DynamoStringStore::from_config(&cfg).await;
        assert_eq!(store.table_name, "t");
        assert_eq!(store.key_attribute, "string-key");
        assert_eq!(store.value_attribute, "string-value");
        let conf = store.client.config();
        assert_eq!(conf.region().map(|r| r.as_ref()), Some("eu-west-1"));
    }
}
