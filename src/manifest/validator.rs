//! Data-source validation. Not fail-fast: every offending source is reported.

use crate::error::{DataSourceDiagnostic, DataSourceError, ValidationError};
use crate::manifest::types::{DataSource, DataSourceVariant, Manifest};

impl DataSource {
    /// Exactly one backing technology, plus its mandatory keys.
    pub fn validate(&self) -> Result<(), DataSourceError> {
        let variant = self.variant().ok_or(DataSourceError::InvalidDataSourceVariant {
            found: self.variant_count(),
        })?;
        match variant {
            DataSourceVariant::Dynamo(d) if d.hash_key().is_none() => {
                Err(DataSourceError::MissingHashKey)
            }
            DataSourceVariant::Sql(s) if s.primary_key.trim().is_empty() => {
                Err(DataSourceError::MissingPrimaryKey)
            }
            _ => Ok(()),
        }
    }
}

pub fn validate_data_sources(manifest: &Manifest) -> Result<(), ValidationError> {
    let errors: Vec<DataSourceDiagnostic> = manifest
        .sources
        .iter()
        .filter_map(|(name, ds)| {
            ds.validate().err().map(|error| DataSourceDiagnostic {
                name: name.clone(),
                error,
            })
        })
        .collect();

    if errors.is_empty() {
        return Ok(());
    }
    for d in &errors {
        tracing::warn!(source = %d.name, error = %d.error, "invalid data source");
    }
    Err(ValidationError { errors })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::manifest::types::{DynamoSource, LambdaSource, SqlSource};

    fn dynamo(hash_key: &str, sort_key: Option<&str>) -> DataSource {
        DataSource {
            dynamo: Some(DynamoSource {
                hash_key: hash_key.into(),
                sort_key: sort_key.map(Into::into),
                disable_backup: false,
            }),
            ..Default::default()
        }
    }

    #[test]
    fn dynamo_requires_hash_key() {
        assert_eq!(dynamo("id:S", None).validate(), Ok(()));
        assert_eq!(dynamo("", None).validate(), Err(DataSourceError::MissingHashKey));
        assert_eq!(
            dynamo("", Some("sorted")).validate(),
            Err(DataSourceError::MissingHashKey)
        );
    }

    #[test]
    fn sql_requires_primary_key() {
        let ds = DataSource {
            sql: Some(SqlSource::default()),
            ..Default::default()
        };
        assert_eq!(ds.validate(), Err(DataSourceError::MissingPrimaryKey));
    }

    #[test]
    fn exactly_one_variant() {
        assert_eq!(
            DataSource::default().validate(),
            Err(DataSourceError::InvalidDataSourceVariant { found: 0 })
        );
        let mut two = dynamo("id", None);
        two.lambda = Some(LambdaSource::default());
        assert_eq!(
            two.validate(),
            Err(DataSourceError::InvalidDataSourceVariant { found: 2 })
        );
    }
}
