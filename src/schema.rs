//! Entity model
//!
//! These types represent one schema module and form the contract between the
//! schema loader (produces) and code generation (consumes).

/// A complete generation unit: entities and enums of one data model
#[derive(Debug, Clone, Default)]
pub struct Module {
    pub name: String,
    entities: Vec<Entity>,
    pub enums: Vec<EnumType>,
}

impl Module {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            entities: Vec::new(),
            enums: Vec::new(),
        }
    }

    /// Insert an entity, keyed by name.
    ///
    /// Re-inserting a known name replaces the entity in place so that the
    /// original insertion position (and therefore output order) is kept.
    pub fn add_entity(&mut self, entity: Entity) {
        match self.entities.iter_mut().find(|e| e.name == entity.name) {
            Some(existing) => *existing = entity,
            None => self.entities.push(entity),
        }
    }

    pub fn with_entity(mut self, entity: Entity) -> Self {
        self.add_entity(entity);
        self
    }

    pub fn with_enum(mut self, enum_type: EnumType) -> Self {
        self.enums.push(enum_type);
        self
    }

    /// Entities in insertion order
    pub fn entities(&self) -> &[Entity] {
        &self.entities
    }

    pub fn entity(&self, name: &str) -> Option<&Entity> {
        self.entities.iter().find(|e| e.name == name)
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }
}

/// One schema-defined record type
#[derive(Debug, Clone)]
pub struct Entity {
    pub name: String,
    /// Explicit table name; defaults to the entity name
    pub table_name: Option<String>,
    pub fields: Vec<EntityField>,
    pub relations: Vec<Relation>,
}

impl Entity {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            table_name: None,
            fields: Vec::new(),
            relations: Vec::new(),
        }
    }

    pub fn with_field(mut self, field: EntityField) -> Self {
        self.fields.push(field);
        self
    }

    pub fn with_relation(mut self, relation: Relation) -> Self {
        self.relations.push(relation);
        self
    }

    pub fn with_table_name(mut self, table_name: impl Into<String>) -> Self {
        self.table_name = Some(table_name.into());
        self
    }

    /// True if any field has no mapping for the active datasource
    pub fn contains_unsupported_types(&self) -> bool {
        self.fields.iter().any(|f| !f.supported)
    }

    pub fn unsupported_fields(&self) -> Vec<&EntityField> {
        self.fields.iter().filter(|f| !f.supported).collect()
    }

    /// Key fields in declaration order
    pub fn key_fields(&self) -> Vec<&EntityField> {
        self.fields.iter().filter(|f| f.is_key).collect()
    }

    pub fn non_key_fields(&self) -> Vec<&EntityField> {
        self.fields.iter().filter(|f| !f.is_key).collect()
    }

    pub fn table_name(&self) -> &str {
        self.table_name.as_deref().unwrap_or(&self.name)
    }

    /// Resource path segment used by the generated client, e.g. `employees`
    pub fn resource_name(&self) -> String {
        format!("{}s", self.name.to_lowercase())
    }

    /// Module-level constant naming this entity, e.g. `MEDICAL_NEED`
    pub fn constant_name(&self) -> String {
        to_upper_snake_case(&self.name)
    }
}

/// A field of an entity
#[derive(Debug, Clone)]
pub struct EntityField {
    pub name: String,
    pub field_type: FieldType,
    pub is_key: bool,
    pub is_nullable: bool,
    /// Whether the target datasource has a mapping for `field_type`
    pub supported: bool,
}

impl EntityField {
    pub fn new(name: impl Into<String>, field_type: FieldType) -> Self {
        Self {
            name: name.into(),
            field_type,
            is_key: false,
            is_nullable: false,
            supported: true,
        }
    }

    pub fn key(mut self) -> Self {
        self.is_key = true;
        self
    }

    pub fn nullable(mut self) -> Self {
        self.is_nullable = true;
        self
    }

    pub fn unsupported(mut self) -> Self {
        self.supported = false;
        self
    }
}

/// Semantic field type
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldType {
    Int,
    String,
    Boolean,
    Float,
    Decimal,
    ByteArray,
    Date,
    TimeOfDay,
    Utc,
    Civil,
    /// Enum declared in the same module
    Enum(String),
    /// Any other type name, carried through as written
    Other(String),
}

impl FieldType {
    /// Types that live in the `time` module
    pub fn is_time(&self) -> bool {
        matches!(
            self,
            FieldType::Date | FieldType::TimeOfDay | FieldType::Utc | FieldType::Civil
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cardinality {
    One,
    Many,
}

/// A relation from one entity to another
#[derive(Debug, Clone)]
pub struct Relation {
    /// Field name of the relation on the owning record
    pub name: String,
    /// Target entity name
    pub target: String,
    pub cardinality: Cardinality,
    /// The owner side holds the foreign key columns
    pub owner: bool,
    pub foreign_keys: Vec<ForeignKey>,
}

/// Foreign key column on the owner pointing at a key field of the target
#[derive(Debug, Clone)]
pub struct ForeignKey {
    pub column: String,
    pub references: String,
}

/// An enum type defined in the module
#[derive(Debug, Clone)]
pub struct EnumType {
    pub name: String,
    pub members: Vec<String>,
}

/// Convert PascalCase or camelCase to UPPER_SNAKE_CASE
pub fn to_upper_snake_case(s: &str) -> String {
    let chars: Vec<char> = s.chars().collect();
    let mut out = String::with_capacity(s.len() + 4);
    for (i, &c) in chars.iter().enumerate() {
        if c.is_uppercase() && i > 0 {
            let prev = chars[i - 1];
            let next_lower = chars.get(i + 1).is_some_and(|n| n.is_lowercase());
            if prev.is_lowercase() || prev.is_ascii_digit() || (prev.is_uppercase() && next_lower) {
                out.push('_');
            }
        }
        out.extend(c.to_uppercase());
    }
    out
}
