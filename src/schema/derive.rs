//! Filter and input object synthesis from base objects.

use crate::error::SchemaError;
use crate::manifest::{Field, FieldType, ResolverAction};
use crate::schema::{FilterObject, InputObject, Object};
use regex::Regex;
use std::sync::LazyLock;

static AWS_SCALAR_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^AWS(Date(Time)?|Time(stamp)?|Email|URL|Phone|IPAddress|JSON)$")
        .expect("Invalid AWS scalar regex")
});
static GRAPHQL_SCALAR_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(ID|String|Int|Float|Boolean)$").expect("Invalid scalar regex"));

/// Scalars that get a full `Table<Type>FilterInput` operator set.
pub const FILTERABLE_SCALARS: [&str; 4] = ["Int", "String", "Float", "ID"];

/// How a field type participates in filtering.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ScalarClass {
    /// AWS extended scalar, filtered as a string.
    Aws,
    /// Core GraphQL scalar.
    Core,
    /// Anything else, typically an object reference.
    Other,
}

pub fn classify(type_name: &str) -> ScalarClass {
    if AWS_SCALAR_REGEX.is_match(type_name) {
        ScalarClass::Aws
    } else if GRAPHQL_SCALAR_REGEX.is_match(type_name) {
        ScalarClass::Core
    } else {
        ScalarClass::Other
    }
}

/// `<Object>Filter`, one filter input per scalar field. Fields that are not
/// scalars, or are resolver-backed, are left out.
pub fn filter_from_object(object: &Object) -> FilterObject {
    let fields = object
        .fields
        .iter()
        .filter_map(|f| {
            let ty = f.field_type.as_ref()?;
            let filter_type = match classify(&ty.name) {
                ScalarClass::Aws => "TableStringFilterInput".to_string(),
                ScalarClass::Core => format!("Table{}FilterInput", ty.name),
                ScalarClass::Other => return None,
            };
            Some(Field::typed(f.name.clone(), FieldType::named(filter_type)))
        })
        .collect();
    Object {
        name: filter_name(&object.name),
        fields,
    }
}

/// Fields that `filter_from_object` drops because their type is not a scalar.
pub fn unfilterable_fields(object: &Object) -> impl Iterator<Item = &Field> + '_ {
    object.fields.iter().filter(|f| {
        f.field_type
            .as_ref()
            .is_some_and(|ty| classify(&ty.name) == ScalarClass::Other)
    })
}

/// `Create<Object>Input` for insert, `Update<Object>Input` for update.
/// Insert omits an `id: ID!` field, which the store generates.
pub fn input_from_object(object: &Object, action: ResolverAction) -> Result<InputObject, SchemaError> {
    let prefix = match action {
        ResolverAction::Insert => "Create",
        ResolverAction::Update => "Update",
        other => {
            return Err(SchemaError::InvalidInputAction {
                object: object.name.clone(),
                action: other.to_string(),
            })
        }
    };

    let fields = object
        .fields
        .iter()
        .filter_map(|f| {
            let declared = f.field_type.as_ref()?;
            if action == ResolverAction::Insert && is_generated_id(&f.name, declared) {
                return None;
            }
            let source = f.input_type.as_ref().unwrap_or(declared);
            Some(Field::typed(
                f.name.clone(),
                FieldType {
                    name: source.name.clone(),
                    is_list: source.is_list,
                    non_nullable: false,
                },
            ))
        })
        .collect();

    Ok(Object {
        name: format!("{}{}Input", prefix, object.name),
        fields,
    })
}

fn is_generated_id(name: &str, ty: &FieldType) -> bool {
    name == "id" && ty.name == "ID" && ty.non_nullable && !ty.is_list
}

pub fn filter_name(object: &str) -> String {
    format!("{}Filter", object)
}
