use crate::error::{Error, Exclusion};
use crate::registry::{RecordType, ENTITY_COLUMN};
use crate::tabular::TabularAccess;
use std::collections::HashMap;
use std::path::{Component, Path};
use std::sync::Arc;

/// Outcome of checking whether a candidate file is fit to use.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationResult {
    Usable { entity_id: Option<String> },
    Rejected(Exclusion),
}

impl ValidationResult {
    pub fn unowned() -> Self {
        ValidationResult::Usable { entity_id: None }
    }

    pub fn is_usable(&self) -> bool {
        matches!(self, ValidationResult::Usable { .. })
    }

    pub fn entity_id(&self) -> Option<&str> {
        match self {
            ValidationResult::Usable { entity_id } => entity_id.as_deref(),
            ValidationResult::Rejected(_) => None,
        }
    }
}

pub trait ValidationStrategy: Send + Sync {
    fn validate(&self, path: &Path) -> ValidationResult;
}

/// Header-only check: every declared column must belong to the type's schema.
pub struct StructuralValidation {
    record_type: RecordType,
    tables: Arc<dyn TabularAccess>,
}

impl StructuralValidation {
    pub fn new(record_type: RecordType, tables: Arc<dyn TabularAccess>) -> Self {
        Self {
            record_type,
            tables,
        }
    }

    fn mismatch(&self, path: &Path, reason: impl Into<String>) -> ValidationResult {
        ValidationResult::Rejected(Exclusion::StructuralMismatch {
            path: path.to_path_buf(),
            record_type: self.record_type,
            reason: reason.into(),
        })
    }
}

impl ValidationStrategy for StructuralValidation {
    fn validate(&self, path: &Path) -> ValidationResult {
        let schema = match self.tables.collect_schema(path, self.record_type.schema()) {
            Ok(schema) => schema,
            Err(Error::NoData(_)) => return ValidationResult::unowned(),
            Err(e) => return self.mismatch(path, e.to_string()),
        };

        let unexpected: Vec<&str> = schema
            .iter()
            .map(|field| field.name.as_str())
            .filter(|name| !self.record_type.has_column(name))
            .collect();

        if unexpected.is_empty() {
            ValidationResult::unowned()
        } else {
            self.mismatch(path, format!("unexpected columns: {}", unexpected.join(", ")))
        }
    }
}

/// Entity ids become directory names under the output root, so they must be
/// exactly one plain path component.
fn is_single_segment(id: &str) -> bool {
    let mut components = Path::new(id).components();
    match (components.next(), components.next()) {
        (Some(Component::Normal(name)), None) => name == id,
        _ => false,
    }
}

/// Structural check plus ownership: the file must name exactly one entity.
pub struct PerEntityValidation {
    structural: StructuralValidation,
}

impl PerEntityValidation {
    pub fn new(record_type: RecordType, tables: Arc<dyn TabularAccess>) -> Self {
        Self {
            structural: StructuralValidation::new(record_type, tables),
        }
    }
}

impl ValidationStrategy for PerEntityValidation {
    fn validate(&self, path: &Path) -> ValidationResult {
        let structural = self.structural.validate(path);
        if !structural.is_usable() {
            return structural;
        }

        let entity_ids = match self.structural.tables.distinct_values(path, ENTITY_COLUMN) {
            Ok(ids) => ids,
            Err(Error::NoData(_)) => return ValidationResult::unowned(),
            Err(e) => return self.structural.mismatch(path, e.to_string()),
        };

        let mut ids = entity_ids.into_iter();
        match (ids.next(), ids.next()) {
            // no rows: fine, nobody owns it
            (None, _) => ValidationResult::unowned(),
            (Some(id), None) if !is_single_segment(&id) => {
                ValidationResult::Rejected(Exclusion::InvalidEntityId {
                    path: path.to_path_buf(),
                    entity_id: id,
                })
            }
            (Some(id), None) => ValidationResult::Usable {
                entity_id: Some(id),
            },
            (Some(first), Some(second)) => {
                let entity_ids = [first, second].into_iter().chain(ids).collect();
                ValidationResult::Rejected(Exclusion::AmbiguousEntity {
                    path: path.to_path_buf(),
                    entity_ids,
                })
            }
        }
    }
}

/// Accepts every file whose name matched a type.
pub struct TrustFilename;

impl ValidationStrategy for TrustFilename {
    fn validate(&self, _path: &Path) -> ValidationResult {
        ValidationResult::unowned()
    }
}

/// Strategy table: which policy applies to each record type.
pub struct ValidationStrategies {
    strategies: HashMap<RecordType, Box<dyn ValidationStrategy>>,
}

impl ValidationStrategies {
    pub fn standard(tables: Arc<dyn TabularAccess>) -> Self {
        let strategies = RecordType::all()
            .map(|record_type| {
                let strategy: Box<dyn ValidationStrategy> = if record_type.is_per_entity() {
                    Box::new(PerEntityValidation::new(record_type, tables.clone()))
                } else {
                    Box::new(StructuralValidation::new(record_type, tables.clone()))
                };
                (record_type, strategy)
            })
            .collect();
        Self { strategies }
    }

    pub fn trust_filename() -> Self {
        let strategies = RecordType::all()
            .map(|record_type| {
                let strategy: Box<dyn ValidationStrategy> = Box::new(TrustFilename);
                (record_type, strategy)
            })
            .collect();
        Self { strategies }
    }

    /// Register or replace the policy for one type.
    pub fn with_strategy(
        mut self,
        record_type: RecordType,
        strategy: Box<dyn ValidationStrategy>,
    ) -> Self {
        self.strategies.insert(record_type, strategy);
        self
    }

    /// Types without a registered policy are accepted as-is.
    pub fn validate(&self, record_type: RecordType, path: &Path) -> ValidationResult {
        match self.strategies.get(&record_type) {
            Some(strategy) => strategy.validate(path),
            None => TrustFilename.validate(path),
        }
    }
}
