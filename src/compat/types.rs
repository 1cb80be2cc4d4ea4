//! Core types for breaking change detection

use crate::model::SourceLocation;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

/// How strongly a finding affects the API's semantic version
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ChangeType {
    /// Breaking change
    Major,
    /// Backward-compatible addition
    Minor,
    Patch,
    None,
}

/// Conventional-commit prefix suggested for a finding
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum ConventionalCommitTag {
    #[serde(rename = "feat")]
    Feat,
    #[serde(rename = "feat!")]
    FeatBreaking,
    #[serde(rename = "fix!")]
    FixBreaking,
    #[serde(rename = "fix")]
    Fix,
    #[serde(rename = "docs")]
    Docs,
    #[serde(rename = "chore")]
    Chore,
}

impl ConventionalCommitTag {
    pub fn as_str(&self) -> &'static str {
        match self {
            ConventionalCommitTag::Feat => "feat",
            ConventionalCommitTag::FeatBreaking => "feat!",
            ConventionalCommitTag::FixBreaking => "fix!",
            ConventionalCommitTag::Fix => "fix",
            ConventionalCommitTag::Docs => "docs",
            ConventionalCommitTag::Chore => "chore",
        }
    }
}

impl fmt::Display for ConventionalCommitTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

macro_rules! finding_categories {
    (
        $(
            ($variant:ident, $id:literal, $change:ident, $tag:ident)
        ),* $(,)?
    ) => {
        /// Every kind of difference the comparator can report
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(rename_all = "SCREAMING_SNAKE_CASE")]
        pub enum FindingCategory {
            $($variant,)*
        }

        impl FindingCategory {
            /// The string identifier used in reports and configuration
            pub fn id(&self) -> &'static str {
                match self {
                    $(FindingCategory::$variant => $id,)*
                }
            }

            pub fn from_id(id: &str) -> Option<Self> {
                match id {
                    $($id => Some(FindingCategory::$variant),)*
                    _ => None,
                }
            }

            pub fn change_type(&self) -> ChangeType {
                match self {
                    $(FindingCategory::$variant => ChangeType::$change,)*
                }
            }

            pub fn conventional_commit_tag(&self) -> ConventionalCommitTag {
                match self {
                    $(FindingCategory::$variant => ConventionalCommitTag::$tag,)*
                }
            }

            pub fn all() -> Vec<Self> {
                vec![$(FindingCategory::$variant,)*]
            }
        }
    };
}

finding_categories! {
    // Fields
    (FieldAddition, "FIELD_ADDITION", Minor, Feat),
    (FieldRemoval, "FIELD_REMOVAL", Major, FixBreaking),
    (FieldNameChange, "FIELD_NAME_CHANGE", Major, FixBreaking),
    (FieldRepeatedChange, "FIELD_REPEATED_CHANGE", Major, FixBreaking),
    (FieldTypeChange, "FIELD_TYPE_CHANGE", Major, FixBreaking),
    (FieldBehaviorChange, "FIELD_BEHAVIOR_CHANGE", Major, FixBreaking),
    (FieldOneofMoveIn, "FIELD_ONEOF_MOVE_IN", Major, FeatBreaking),
    (FieldOneofRemoval, "FIELD_ONEOF_REMOVAL", Major, FixBreaking),
    (FieldProto3OptionalChange, "FIELD_PROTO3_OPTIONAL_CHANGE", Major, FixBreaking),
    (FieldFormatChange, "FIELD_FORMAT_CHANGE", Major, FixBreaking),
    // Resources
    (ResourceReferenceAddition, "RESOURCE_REFERENCE_ADDITION", Minor, Feat),
    (ResourceReferenceRemoval, "RESOURCE_REFERENCE_REMOVAL", Major, FixBreaking),
    (ResourceReferenceChange, "RESOURCE_REFERENCE_CHANGE", Major, FixBreaking),
    (ResourceReferenceMoved, "RESOURCE_REFERENCE_MOVED", None, Chore),
    (ResourceDefinitionAddition, "RESOURCE_DEFINITION_ADDITION", Minor, Feat),
    (ResourceDefinitionRemoval, "RESOURCE_DEFINITION_REMOVAL", Major, FixBreaking),
    (ResourcePatternAddition, "RESOURCE_PATTERN_ADDITION", Minor, Feat),
    (ResourcePatternRemoval, "RESOURCE_PATTERN_REMOVAL", Major, FixBreaking),
    (ResourcePatternChange, "RESOURCE_PATTERN_CHANGE", Major, FixBreaking),
    // Messages and enums
    (MessageAddition, "MESSAGE_ADDITION", Minor, Feat),
    (MessageRemoval, "MESSAGE_REMOVAL", Major, FixBreaking),
    (EnumAddition, "ENUM_ADDITION", Minor, Feat),
    (EnumRemoval, "ENUM_REMOVAL", Major, FixBreaking),
    (EnumValueAddition, "ENUM_VALUE_ADDITION", Minor, Feat),
    (EnumValueRemoval, "ENUM_VALUE_REMOVAL", Major, FixBreaking),
    (EnumValueNameChange, "ENUM_VALUE_NAME_CHANGE", Major, FixBreaking),
    // Services and methods
    (ServiceAddition, "SERVICE_ADDITION", Minor, Feat),
    (ServiceRemoval, "SERVICE_REMOVAL", Major, FixBreaking),
    (ServiceHostAddition, "SERVICE_HOST_ADDITION", Minor, Feat),
    (ServiceHostRemoval, "SERVICE_HOST_REMOVAL", Major, FixBreaking),
    (ServiceHostChange, "SERVICE_HOST_CHANGE", Major, FixBreaking),
    (OauthScopeAddition, "OAUTH_SCOPE_ADDITION", Minor, Feat),
    (OauthScopeRemoval, "OAUTH_SCOPE_REMOVAL", Major, FixBreaking),
    (MethodAddition, "METHOD_ADDITION", Minor, Feat),
    (MethodRemoval, "METHOD_REMOVAL", Major, FixBreaking),
    (MethodInputTypeChange, "METHOD_INPUT_TYPE_CHANGE", Major, FixBreaking),
    (MethodResponseTypeChange, "METHOD_RESPONSE_TYPE_CHANGE", Major, FixBreaking),
    (MethodClientStreamingChange, "METHOD_CLIENT_STREAMING_CHANGE", Major, FixBreaking),
    (MethodServerStreamingChange, "METHOD_SERVER_STREAMING_CHANGE", Major, FixBreaking),
    (MethodPaginatedResponseChange, "METHOD_PAGINATED_RESPONSE_CHANGE", Major, FixBreaking),
    (MethodSignatureAddition, "METHOD_SIGNATURE_ADDITION", Minor, Feat),
    (MethodSignatureRemoval, "METHOD_SIGNATURE_REMOVAL", Major, FixBreaking),
    (HttpAnnotationAddition, "HTTP_ANNOTATION_ADDITION", Minor, Feat),
    (HttpAnnotationRemoval, "HTTP_ANNOTATION_REMOVAL", Major, FixBreaking),
    (HttpAnnotationChange, "HTTP_ANNOTATION_CHANGE", Major, FixBreaking),
    (LroAnnotationAddition, "LRO_ANNOTATION_ADDITION", Minor, Feat),
    (LroAnnotationRemoval, "LRO_ANNOTATION_REMOVAL", Minor, Fix),
    (LroResponseChange, "LRO_RESPONSE_CHANGE", Major, FixBreaking),
    (LroMetadataChange, "LRO_METADATA_CHANGE", Major, FixBreaking),
    // Files
    (PackagingOptionAddition, "PACKAGING_OPTION_ADDITION", Minor, Feat),
    (PackagingOptionRemoval, "PACKAGING_OPTION_REMOVAL", Major, FixBreaking),
    // Documentation
    (CommentChange, "COMMENT_CHANGE", Patch, Docs),
}

impl FindingCategory {
    pub fn is_breaking(&self) -> bool {
        self.change_type() == ChangeType::Major
    }
}

impl fmt::Display for FindingCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.id())
    }
}

impl std::str::FromStr for FindingCategory {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_id(s).ok_or_else(|| format!("Unknown finding category: {s}"))
    }
}

/// Where a finding was observed
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FindingLocation {
    pub proto_file_name: String,
    /// 1-based line, serialized as -1 when unknown
    #[serde(serialize_with = "serialize_line", deserialize_with = "deserialize_line")]
    pub source_code_line: Option<u32>,
}

impl From<&SourceLocation> for FindingLocation {
    fn from(location: &SourceLocation) -> Self {
        Self {
            proto_file_name: location.file_name.clone(),
            source_code_line: location.line,
        }
    }
}

fn serialize_line<S: Serializer>(line: &Option<u32>, serializer: S) -> Result<S::Ok, S::Error> {
    match line {
        Some(line) => serializer.serialize_i64(i64::from(*line)),
        None => serializer.serialize_i64(-1),
    }
}

fn deserialize_line<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<u32>, D::Error> {
    let line = i64::deserialize(deserializer)?;
    Ok(u32::try_from(line).ok().filter(|l| *l > 0))
}

/// A single classified difference between the two API definitions
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Finding {
    pub category: FindingCategory,
    pub location: FindingLocation,
    pub change_type: ChangeType,
    pub conventional_commit_tag: ConventionalCommitTag,
    /// Name of the changed declaration (the new name for renames)
    pub subject: String,
    pub oldsubject: Option<String>,
    /// Enclosing declaration, e.g. the message of a field
    pub context: Option<String>,
    #[serde(rename = "type")]
    pub type_: Option<String>,
    pub oldtype: Option<String>,
    /// Rendering hints only
    #[serde(default)]
    pub extra_info: Vec<String>,
}

impl Finding {
    pub fn new(category: FindingCategory, location: &SourceLocation, subject: impl Into<String>) -> Self {
        Self {
            category,
            location: location.into(),
            change_type: category.change_type(),
            conventional_commit_tag: category.conventional_commit_tag(),
            subject: subject.into(),
            oldsubject: None,
            context: None,
            type_: None,
            oldtype: None,
            extra_info: Vec::new(),
        }
    }

    pub fn with_oldsubject(mut self, oldsubject: impl Into<String>) -> Self {
        self.oldsubject = Some(oldsubject.into());
        self
    }

    pub fn with_context(mut self, context: impl Into<String>) -> Self {
        self.context = Some(context.into());
        self
    }

    /// Sets the new and old type strings
    pub fn with_types(mut self, type_: impl Into<String>, oldtype: impl Into<String>) -> Self {
        self.type_ = Some(type_.into());
        self.oldtype = Some(oldtype.into());
        self
    }

    pub fn with_type(mut self, type_: impl Into<String>) -> Self {
        self.type_ = Some(type_.into());
        self
    }

    pub fn with_oldtype(mut self, oldtype: impl Into<String>) -> Self {
        self.oldtype = Some(oldtype.into());
        self
    }

    pub fn with_extra_info(mut self, extra: impl Into<String>) -> Self {
        self.extra_info.push(extra.into());
        self
    }

    pub fn is_breaking(&self) -> bool {
        self.change_type == ChangeType::Major
    }

    /// Ordering used for every report: file, line, subject, old subject,
    /// context, type, old type; category breaks remaining ties.
    #[allow(clippy::type_complexity)]
    pub fn sort_key(
        &self,
    ) -> (
        &str,
        Option<u32>,
        &str,
        Option<&str>,
        Option<&str>,
        Option<&str>,
        Option<&str>,
        FindingCategory,
    ) {
        (
            &self.location.proto_file_name,
            self.location.source_code_line,
            &self.subject,
            self.oldsubject.as_deref(),
            self.context.as_deref(),
            self.type_.as_deref(),
            self.oldtype.as_deref(),
            self.category,
        )
    }
}
