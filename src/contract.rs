//! Contract entity wrapper: table descriptor and explorer endpoints.

use std::sync::{Arc, LazyLock};

use chrono::{DateTime, Utc};

use crate::client::Client;
use crate::decode::decode_object;
use crate::descriptor::{FieldDescriptor, FieldKind, TableEntity, TypeDescriptor};
use crate::errors::TzQueryError;
use crate::script::{RawScript, ScriptMetadata};

/// A smart contract row from the `contract` table.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Contract {
    pub row_id: u64,
    pub account_id: u64,
    pub address: String,
    pub creator_id: u64,
    pub creator: String,
    pub first_seen: i64,
    pub last_seen: i64,
    pub first_seen_time: Option<DateTime<Utc>>,
    pub last_seen_time: Option<DateTime<Utc>>,
    pub storage_size: i64,
    pub storage_paid: i64,
    pub total_fees_used: f64,
    pub iface_hash: Vec<u8>,
    pub code_hash: Vec<u8>,
    pub storage_hash: Vec<u8>,
    pub features: Vec<String>,
    pub interfaces: Vec<String>,
}

static CONTRACT_DESCRIPTOR: LazyLock<TypeDescriptor<Contract>> = LazyLock::new(|| {
    TypeDescriptor::new(vec![
        FieldDescriptor::new("row_id", FieldKind::U64, |c, v| {
            c.row_id = v.into_u64("row_id")?;
            Ok(())
        }),
        FieldDescriptor::new("account_id", FieldKind::U64, |c, v| {
            c.account_id = v.into_u64("account_id")?;
            Ok(())
        }),
        FieldDescriptor::new("address", FieldKind::Str, |c, v| {
            c.address = v.into_str("address")?;
            Ok(())
        }),
        FieldDescriptor::new("creator_id", FieldKind::U64, |c, v| {
            c.creator_id = v.into_u64("creator_id")?;
            Ok(())
        }),
        FieldDescriptor::new("creator", FieldKind::Str, |c, v| {
            c.creator = v.into_str("creator")?;
            Ok(())
        }),
        FieldDescriptor::new("first_seen", FieldKind::I64, |c, v| {
            c.first_seen = v.into_i64("first_seen")?;
            Ok(())
        }),
        FieldDescriptor::new("last_seen", FieldKind::I64, |c, v| {
            c.last_seen = v.into_i64("last_seen")?;
            Ok(())
        }),
        FieldDescriptor::new("first_seen_time", FieldKind::Time, |c, v| {
            c.first_seen_time = Some(v.into_time("first_seen_time")?);
            Ok(())
        }),
        FieldDescriptor::new("last_seen_time", FieldKind::Time, |c, v| {
            c.last_seen_time = Some(v.into_time("last_seen_time")?);
            Ok(())
        }),
        FieldDescriptor::new("storage_size", FieldKind::I64, |c, v| {
            c.storage_size = v.into_i64("storage_size")?;
            Ok(())
        }),
        FieldDescriptor::new("storage_paid", FieldKind::I64, |c, v| {
            c.storage_paid = v.into_i64("storage_paid")?;
            Ok(())
        }),
        FieldDescriptor::new("total_fees_used", FieldKind::F64, |c, v| {
            c.total_fees_used = v.into_f64("total_fees_used")?;
            Ok(())
        }),
        FieldDescriptor::new("iface_hash", FieldKind::Hex, |c, v| {
            c.iface_hash = v.into_hex("iface_hash")?;
            Ok(())
        }),
        FieldDescriptor::new("code_hash", FieldKind::Hex, |c, v| {
            c.code_hash = v.into_hex("code_hash")?;
            Ok(())
        }),
        FieldDescriptor::new("storage_hash", FieldKind::Hex, |c, v| {
            c.storage_hash = v.into_hex("storage_hash")?;
            Ok(())
        }),
        FieldDescriptor::new("features", FieldKind::Nested, |c, v| {
            c.features = v.into_nested("features")?;
            Ok(())
        }),
        FieldDescriptor::new("interfaces", FieldKind::Nested, |c, v| {
            c.interfaces = v.into_nested("interfaces")?;
            Ok(())
        }),
    ])
});

impl TableEntity for Contract {
    const TABLE: &'static str = "contract";

    fn descriptor() -> &'static TypeDescriptor<Self> {
        &CONTRACT_DESCRIPTOR
    }

    fn row_id(&self) -> u64 {
        self.row_id
    }
}

impl Client {
    /// Fetches a single contract from the explorer endpoint.
    pub async fn contract(&self, address: &str) -> Result<Contract, TzQueryError> {
        let path = format!("/explorer/contract/{address}");
        let value: serde_json::Value = self.get_json(&path, &[]).await?;
        Ok(decode_object(&value)?)
    }

    /// Resolves a contract's script metadata through the per-client cache.
    ///
    /// Cache misses fetch the script remotely; concurrent misses for the
    /// same address share a single fetch and all callers receive the same
    /// metadata allocation.
    pub async fn contract_script(
        &self,
        address: &str,
    ) -> Result<Arc<ScriptMetadata>, TzQueryError> {
        self.scripts()
            .get_or_load(address, || async {
                let path = format!("/explorer/contract/{address}/script");
                let raw: RawScript = self
                    .get_json(&path, &[("prim".to_string(), "1".to_string())])
                    .await?;
                Ok(ScriptMetadata::from_raw(raw))
            })
            .await
    }
}
