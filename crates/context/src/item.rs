use serde::{Deserialize, Serialize};
use std::fmt;
use trigger_doc::{MarshalContext, Persist, UnmarshalContext, XmlReader, XmlWriter};

pub(crate) const BUILD_NUMBER: &str = "buildNumber";
pub(crate) const PROJECT_ID: &str = "projectId";

/// Pointer to a build: the owning job and, when known, its build number.
///
/// References are plain values. They carry no identity in the document graph
/// and are compared field by field.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ItemReference {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub build_number: Option<u64>,
    pub owner_id: String,
}

impl ItemReference {
    pub fn new(owner_id: impl Into<String>, build_number: u64) -> Self {
        Self {
            build_number: Some(build_number),
            owner_id: owner_id.into(),
        }
    }

    /// A reference to a job whose build is not known, as found in older
    /// matrix records.
    pub fn owner_only(owner_id: impl Into<String>) -> Self {
        Self {
            build_number: None,
            owner_id: owner_id.into(),
        }
    }

    pub fn is_build(&self) -> bool {
        self.build_number.is_some()
    }

    pub fn matches_owner(&self, owner_id: &str) -> bool {
        self.owner_id == owner_id
    }
}

impl fmt::Display for ItemReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.build_number {
            Some(number) => write!(f, "{}#{number}", self.owner_id),
            None => write!(f, "{}", self.owner_id),
        }
    }
}

impl Persist for ItemReference {
    const ALIAS: &'static str = "itemReference";

    fn marshal(&self, writer: &mut XmlWriter, ctx: &mut MarshalContext<'_>) -> trigger_doc::Result<()> {
        ctx.write_optional(writer, BUILD_NUMBER, self.build_number.as_ref())?;
        ctx.write_field(writer, PROJECT_ID, &self.owner_id)
    }

    fn unmarshal(reader: &XmlReader<'_>, ctx: &mut UnmarshalContext<'_>) -> trigger_doc::Result<Self> {
        Ok(Self {
            build_number: ctx.read_field(reader, BUILD_NUMBER)?,
            owner_id: ctx.read_required(reader, PROJECT_ID)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_includes_number_when_known() {
        assert_eq!(ItemReference::new("projectX", 100).to_string(), "projectX#100");
        assert_eq!(ItemReference::owner_only("master-theme").to_string(), "master-theme");
    }

    #[test]
    fn owner_only_reference_is_not_a_build() {
        let reference = ItemReference::owner_only("master-theme");
        assert!(!reference.is_build());
        assert!(reference.matches_owner("master-theme"));
        assert!(!reference.matches_owner("master"));
    }

    #[test]
    fn summary_json_omits_missing_number() {
        let json = serde_json::to_string(&ItemReference::owner_only("job")).unwrap();
        assert_eq!(json, r#"{"ownerId":"job"}"#);
    }
}
