//! Fixed BIO tag table for the clinical corpus and its derived lookups.
//!
//! Ids `0..=22` begin an entity, `23..=45` continue one, and `46`/`47` are the
//! later-added `CANCER_CONCEPT` pair, which uses the `-` separator instead of
//! `_`. Both separators are accepted wherever a label is parsed.

use std::collections::HashMap;
use std::fmt;
use std::sync::OnceLock;

use crate::constants::schema::{OUTSIDE_LABEL, OUTSIDE_TAG_ID, TAG_COUNT};
use crate::types::TagId;

const TAG_TABLE: [(TagId, &str); TAG_COUNT] = [
    (0, "B_AGE"),
    (1, "B_STAGE"),
    (2, "B_DATE"),
    (3, "B_IMPLICIT_DATE"),
    (4, "B_TNM"),
    (5, "B_FAMILY"),
    (6, "B_OCURRENCE_EVENT"),
    (7, "B_TOXIC_HABITS"),
    (8, "B_HABIT-QUANTITY"),
    (9, "B_TREATMENT_NAME"),
    (10, "B_LINE_CICLE_NUMBER"),
    (11, "B_SURGERY"),
    (12, "B_DRUG"),
    (13, "B_DOSE"),
    (14, "B_FREQ"),
    (15, "B_BIOMARKER"),
    (16, "B_CLINICAL_SERVICE"),
    (17, "B_COMORBIDITY"),
    (18, "B_PROGRESION"),
    (19, "B_GINECOLOGICAL_HISTORY"),
    (20, "B_GINE_OBSTETRICS"),
    (21, "B_ALLERGIES"),
    (22, "B_DURATION"),
    (23, "I_AGE"),
    (24, "I_STAGE"),
    (25, "I_DATE"),
    (26, "I_IMPLICIT_DATE"),
    (27, "I_TNM"),
    (28, "I_FAMILY"),
    (29, "I_OCURRENCE_EVENT"),
    (30, "I_TOXIC_HABITS"),
    (31, "I_HABIT-QUANTITY"),
    (32, "I_TREATMENT_NAME"),
    (33, "I_LINE_CICLE_NUMBER"),
    (34, "I_SURGERY"),
    (35, "I_DRUG"),
    (36, "I_DOSE"),
    (37, "I_FREQ"),
    (38, "I_BIOMARKER"),
    (39, "I_CLINICAL_SERVICE"),
    (40, "I_COMORBIDITY"),
    (41, "I_PROGRESION"),
    (42, "I_GINECOLOGICAL_HISTORY"),
    (43, "I_GINE_OBSTETRICS"),
    (44, "I_ALLERGIES"),
    (45, "I_DURATION"),
    (46, "B-CANCER_CONCEPT"),
    (47, "I-CANCER_CONCEPT"),
];

/// A parsed BIO label.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum BioLabel {
    /// Outside any entity.
    Outside,
    /// First token of an entity.
    Begin {
        /// Raw label as written in the table (for example `B_DATE`).
        label: &'static str,
        /// Entity type with the prefix stripped (for example `DATE`).
        entity_type: &'static str,
    },
    /// Continuation token of an entity.
    Inside {
        /// Raw label as written in the table (for example `I_DATE`).
        label: &'static str,
        /// Entity type with the prefix stripped.
        entity_type: &'static str,
    },
}

impl BioLabel {
    /// Parse a table label. Anything without a `B`/`I` prefix is outside.
    pub fn parse(label: &'static str) -> Self {
        let entity_type = entity_type_of(label);
        if entity_type.len() == label.len() {
            return BioLabel::Outside;
        }
        match label.as_bytes()[0] {
            b'B' => BioLabel::Begin { label, entity_type },
            _ => BioLabel::Inside { label, entity_type },
        }
    }

    /// Entity type for begin/inside labels.
    pub fn entity_type(&self) -> Option<&'static str> {
        match self {
            BioLabel::Outside => None,
            BioLabel::Begin { entity_type, .. } | BioLabel::Inside { entity_type, .. } => {
                Some(entity_type)
            }
        }
    }

    /// Raw label text (`O` for outside).
    pub fn as_str(&self) -> &'static str {
        match self {
            BioLabel::Outside => OUTSIDE_LABEL,
            BioLabel::Begin { label, .. } | BioLabel::Inside { label, .. } => label,
        }
    }

    /// True when this label opens an entity span.
    pub fn is_begin(&self) -> bool {
        matches!(self, BioLabel::Begin { .. })
    }

    /// True when this label continues an entity span.
    pub fn is_inside(&self) -> bool {
        matches!(self, BioLabel::Inside { .. })
    }
}

impl fmt::Display for BioLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Result of looking up a tag id.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TagLabel {
    /// Id present in the table (or the conventional outside id).
    Known(BioLabel),
    /// Id outside the table. Callers usually treat it as outside.
    Unrecognized(TagId),
}

impl TagLabel {
    /// Collapse an unrecognized id into [`BioLabel::Outside`].
    pub fn or_outside(self) -> BioLabel {
        match self {
            TagLabel::Known(label) => label,
            TagLabel::Unrecognized(_) => BioLabel::Outside,
        }
    }

    /// True for ids missing from the table.
    pub fn is_unrecognized(&self) -> bool {
        matches!(self, TagLabel::Unrecognized(_))
    }
}

/// Strip a `B_`, `I_`, `B-`, or `I-` prefix from a label.
///
/// Labels without one of those prefixes are returned unchanged.
pub fn entity_type_of(label: &str) -> &str {
    let bytes = label.as_bytes();
    if bytes.len() > 2 && matches!(bytes[0], b'B' | b'I') && matches!(bytes[1], b'_' | b'-') {
        &label[2..]
    } else {
        label
    }
}

/// Immutable view over the tag table with entity-type lookups.
#[derive(Debug)]
pub struct TagSchema {
    labels: Vec<(TagId, BioLabel)>,
    begin_ids: HashMap<&'static str, TagId>,
    inside_ids: HashMap<&'static str, TagId>,
}

impl TagSchema {
    /// Shared schema for the clinical tag table.
    pub fn clinical() -> &'static TagSchema {
        static SCHEMA: OnceLock<TagSchema> = OnceLock::new();
        SCHEMA.get_or_init(|| TagSchema::from_table(&TAG_TABLE))
    }

    fn from_table(table: &[(TagId, &'static str)]) -> Self {
        let mut labels = Vec::with_capacity(table.len());
        let mut begin_ids = HashMap::new();
        let mut inside_ids = HashMap::new();
        for &(id, raw) in table {
            let label = BioLabel::parse(raw);
            match label {
                // First matching id wins, mirroring table order.
                BioLabel::Begin { entity_type, .. } => {
                    begin_ids.entry(entity_type).or_insert(id);
                }
                BioLabel::Inside { entity_type, .. } => {
                    inside_ids.entry(entity_type).or_insert(id);
                }
                BioLabel::Outside => {}
            }
            labels.push((id, label));
        }
        Self {
            labels,
            begin_ids,
            inside_ids,
        }
    }

    /// Label for `id`, or [`TagLabel::Unrecognized`] when the id is unknown.
    pub fn label_of(&self, id: TagId) -> TagLabel {
        if id == OUTSIDE_TAG_ID {
            return TagLabel::Known(BioLabel::Outside);
        }
        let found = usize::try_from(id)
            .ok()
            .and_then(|idx| self.labels.get(idx))
            .filter(|(table_id, _)| *table_id == id)
            .map(|(_, label)| *label)
            .or_else(|| {
                self.labels
                    .iter()
                    .find(|(table_id, _)| *table_id == id)
                    .map(|(_, label)| *label)
            });
        match found {
            Some(label) => TagLabel::Known(label),
            None => TagLabel::Unrecognized(id),
        }
    }

    /// Id that begins an entity of `entity_type`.
    pub fn begin_id_of(&self, entity_type: &str) -> Option<TagId> {
        self.begin_ids.get(entity_type).copied()
    }

    /// Id that continues an entity of `entity_type`.
    pub fn inside_id_of(&self, entity_type: &str) -> Option<TagId> {
        self.inside_ids.get(entity_type).copied()
    }

    /// Entity types in table order.
    pub fn entity_types(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.labels.iter().filter_map(|(_, label)| match label {
            BioLabel::Begin { entity_type, .. } => Some(*entity_type),
            _ => None,
        })
    }

    /// Number of labelled ids.
    pub fn len(&self) -> usize {
        self.labels.len()
    }

    /// True when the table is empty.
    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    /// Hyphen-form class names indexed by tag id, ending with `O` at the
    /// outside id.
    ///
    /// This is the ordering a class-label feature expects when the corpus is
    /// exported to a training framework.
    pub fn class_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self
            .labels
            .iter()
            .map(|(_, label)| match label {
                BioLabel::Outside => OUTSIDE_LABEL.to_string(),
                BioLabel::Begin { entity_type, .. } => format!("B-{entity_type}"),
                BioLabel::Inside { entity_type, .. } => format!("I-{entity_type}"),
            })
            .collect();
        names.push(OUTSIDE_LABEL.to_string());
        names
    }
}
