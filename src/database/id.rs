/*
 *     Copyright (C) 2023  Fritz Ochsmann
 *
 *     This program is free software: you can redistribute it and/or modify
 *     it under the terms of the GNU Affero General Public License as published
 *     by the Free Software Foundation, either version 3 of the License, or
 *     (at your option) any later version.
 *
 *     This program is distributed in the hope that it will be useful,
 *     but WITHOUT ANY WARRANTY; without even the implied warranty of
 *     MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
 *     GNU Affero General Public License for more details.
 *
 *     You should have received a copy of the GNU Affero General Public License
 *     along with this program.  If not, see <http://www.gnu.org/licenses/>.
 */

use crate::error::ApplicationError;
use serde::de::Error;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt::{Display, Formatter};
use surrealdb::sql::Thing;

const ALPHABET: [char; 62] = [
    '0', '1', '2', '3', '4', '5', '6', '7', '8', '9', 'a', 'b', 'c', 'd', 'e', 'f', 'g', 'h', 'i',
    'j', 'k', 'l', 'm', 'n', 'o', 'p', 'q', 'r', 's', 't', 'u', 'v', 'w', 'x', 'y', 'z', 'A', 'B',
    'C', 'D', 'E', 'F', 'G', 'H', 'I', 'J', 'K', 'L', 'M', 'N', 'O', 'P', 'Q', 'R', 'S', 'T', 'U',
    'V', 'W', 'X', 'Y', 'Z',
];

const KEY_LENGTH: usize = 20;

/// A record identifier, rendered as `table:key`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Id {
    pub table: String,
    pub key: String,
}

// surrealdb escapes keys which are not plain identifiers
fn unescape(key: &str) -> String {
    key.trim_start_matches(['⟨', '`'])
        .trim_end_matches(['⟩', '`'])
        .to_owned()
}

impl From<Thing> for Id {
    fn from(thing: Thing) -> Self {
        Self {
            table: thing.tb,
            key: unescape(thing.id.to_string().as_str()),
        }
    }
}

impl Id {
    pub fn new(table: &str, key: &str) -> Self {
        Self {
            table: table.to_owned(),
            key: key.to_owned(),
        }
    }

    /// A new identifier with a random key.
    pub fn generate(table: &str) -> Self {
        Self::new(table, nanoid::nanoid!(KEY_LENGTH, &ALPHABET).as_str())
    }

    /// Parses either a bare key or a full `table:key` identifier, which has to name the
    /// expected table.
    pub fn parse(table: &str, raw: &str) -> Result<Self, ApplicationError> {
        let raw = raw.trim();
        let key = match raw.split_once(':') {
            Some((prefix, key)) if prefix.eq(table) => key,
            Some(_) => return Err(ApplicationError::BadRequest(format!("invalid {table} id"))),
            None => raw,
        };

        let key = unescape(key);
        if key.is_empty() {
            return Err(ApplicationError::BadRequest(format!("invalid {table} id")));
        }

        Ok(Self::new(table, key.as_str()))
    }

    pub fn to_thing(&self) -> Thing {
        Thing::from((self.table.as_str(), self.key.as_str()))
    }
}

impl Display for Id {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.table, self.key)
    }
}

impl<'de> Deserialize<'de> for Id {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw_value = serde_json::value::Value::deserialize(deserializer)?;

        if let Some(string) = raw_value.as_str() {
            let (table, key) = string
                .split_once(':')
                .ok_or_else(|| D::Error::custom("Invalid id format"))?;

            return Ok(Self::new(table, unescape(key).as_str()));
        }

        if raw_value.is_object() {
            let thing = serde_json::from_value::<Thing>(raw_value).map_err(D::Error::custom)?;
            return Ok(Self::from(thing));
        }

        Err(D::Error::custom("Invalid datatype"))
    }
}

impl Serialize for Id {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(self.to_string().as_str())
    }
}

/// An identifier as supplied by a client: a number, a bare key or a full `table:key`.
#[derive(Deserialize, Debug, Clone, PartialEq)]
#[serde(untagged)]
pub enum RawId {
    Number(u64),
    Text(String),
}

impl RawId {
    pub fn into_id(self, table: &str) -> Result<Id, ApplicationError> {
        match self {
            RawId::Number(number) => Ok(Id::new(table, number.to_string().as_str())),
            RawId::Text(text) => Id::parse(table, text.as_str()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse() {
        assert_eq!(Id::parse("task", "abc").unwrap(), Id::new("task", "abc"));
        assert_eq!(Id::parse("task", "task:abc").unwrap(), Id::new("task", "abc"));
        assert_eq!(
            Id::parse("task", "task:⟨7⟩").unwrap(),
            Id::new("task", "7")
        );
        assert!(matches!(
            Id::parse("task", "project:abc"),
            Err(ApplicationError::BadRequest(_))
        ));
        assert!(Id::parse("task", "task:").is_err());
        assert!(Id::parse("task", "  ").is_err());
    }

    #[test]
    fn test_generate() {
        let id = Id::generate("user");
        assert_eq!(id.table, "user");
        assert_eq!(id.key.len(), KEY_LENGTH);
        assert_ne!(id, Id::generate("user"));
    }

    #[test]
    fn test_string_form() {
        let id: Id = serde_json::from_value(json!("user:⟨7⟩")).unwrap();
        assert_eq!(id, Id::new("user", "7"));
        assert_eq!(serde_json::to_value(&id).unwrap(), json!("user:7"));
        assert!(serde_json::from_value::<Id>(json!("user")).is_err());
        assert!(serde_json::from_value::<Id>(json!(7)).is_err());
    }

    #[test]
    fn test_thing_round() {
        let id = Id::new("project", "a1b2");
        assert_eq!(Id::from(id.to_thing()), id);
    }

    #[test]
    fn test_raw_id() {
        let raw: RawId = serde_json::from_value(json!(7)).unwrap();
        assert_eq!(raw.into_id("user").unwrap(), Id::new("user", "7"));

        let raw: RawId = serde_json::from_value(json!("user:abc")).unwrap();
        assert_eq!(raw.into_id("user").unwrap(), Id::new("user", "abc"));

        let raw: RawId = serde_json::from_value(json!("task:abc")).unwrap();
        assert!(raw.into_id("user").is_err());
    }
}
