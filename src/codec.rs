// Wire representations of accounts
//
// JSON is the default; XML mirrors the same schema with <account> as the
// root element and <accounts> wrapping lists.

use serde::Serialize;

use crate::account::Account;
use crate::error::CodecError;

pub const JSON_MIME: &str = "application/json";
pub const XML_MIME: &str = "application/xml";

const ACCOUNT_ROOT: &str = "account";
const LIST_ROOT: &str = "accounts";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    Json,
    Xml,
}

/// Media type without parameters, lowercased (`Application/JSON; charset=x` -> `application/json`)
fn media_essence(media_type: &str) -> String {
    media_type
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase()
}

fn classify(essence: &str) -> Option<Format> {
    match essence {
        "application/json" => Some(Format::Json),
        "application/xml" | "text/xml" => Some(Format::Xml),
        e if e.ends_with("+json") => Some(Format::Json),
        e if e.ends_with("+xml") => Some(Format::Xml),
        _ => None,
    }
}

impl Format {
    /// Format of a request body. A missing header means JSON.
    pub fn from_content_type(header: Option<&str>) -> Result<Format, CodecError> {
        let Some(value) = header else {
            return Ok(Format::Json);
        };

        let essence = media_essence(value);
        classify(&essence).ok_or(CodecError::UnsupportedMediaType(essence))
    }

    /// Format of a response body: the first acceptable entry of `Accept` wins.
    /// Quality values are not weighed.
    pub fn from_accept(header: Option<&str>) -> Format {
        let Some(value) = header else {
            return Format::Json;
        };

        for entry in value.split(',') {
            let essence = media_essence(entry);
            if let Some(format) = classify(&essence) {
                return format;
            }
            if essence == "*/*" || essence == "application/*" {
                return Format::Json;
            }
        }

        Format::Json
    }

    pub fn content_type(&self) -> &'static str {
        match self {
            Format::Json => JSON_MIME,
            Format::Xml => XML_MIME,
        }
    }
}

#[derive(Serialize)]
struct AccountListRef<'a> {
    #[serde(rename = "account")]
    accounts: &'a [Account],
}

pub fn decode_account(format: Format, body: &[u8]) -> Result<Account, CodecError> {
    match format {
        Format::Json => Ok(serde_json::from_slice(body)?),
        Format::Xml => Ok(quick_xml::de::from_reader(body)?),
    }
}

pub fn encode_account(format: Format, account: &Account) -> Result<String, CodecError> {
    match format {
        Format::Json => Ok(serde_json::to_string(account)?),
        Format::Xml => Ok(quick_xml::se::to_string_with_root(ACCOUNT_ROOT, account)?),
    }
}

pub fn encode_accounts(format: Format, accounts: &[Account]) -> Result<String, CodecError> {
    match format {
        Format::Json => Ok(serde_json::to_string(accounts)?),
        Format::Xml => Ok(quick_xml::se::to_string_with_root(
            LIST_ROOT,
            &AccountListRef { accounts },
        )?),
    }
}
