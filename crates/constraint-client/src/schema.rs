use constraint_domain::{SchemaError, SchemaValidator};
use constraint_types::{ParameterSchema, Parameters};

/// Default schema validator: parameter schemas are JSON Schema documents, and constraint
/// parameters are validated against them as one JSON object.
#[derive(Clone, Copy, Debug, Default)]
pub struct JsonSchemaValidator;

impl SchemaValidator for JsonSchemaValidator {
    fn validate(&self, schema: &ParameterSchema) -> Result<(), SchemaError> {
        jsonschema::meta::validate(schema.as_value())
            .map_err(|e| SchemaError::new(e.to_string()))?;
        jsonschema::validator_for(schema.as_value())
            .map(|_| ())
            .map_err(|e| SchemaError::new(e.to_string()))
    }

    fn validate_parameters(
        &self,
        schema: &ParameterSchema,
        parameters: &Parameters,
    ) -> Result<(), SchemaError> {
        let validator = jsonschema::validator_for(schema.as_value())
            .map_err(|e| SchemaError::new(e.to_string()))?;
        let instance = parameters.to_json();
        let errors: Vec<String> = validator
            .iter_errors(&instance)
            .map(|e| e.to_string())
            .collect();
        if errors.is_empty() {
            Ok(())
        } else {
            Err(SchemaError::new(errors.join("; ")))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn names_schema() -> ParameterSchema {
        ParameterSchema::new(json!({
            "type": "object",
            "properties": {
                "names": { "type": "array", "items": { "type": "string" } }
            },
            "required": ["names"]
        }))
    }

    #[test]
    fn accepts_well_formed_schema() {
        assert!(JsonSchemaValidator.validate(&names_schema()).is_ok());
    }

    #[test]
    fn rejects_malformed_schema() {
        let bad = ParameterSchema::new(json!({ "type": 12 }));
        assert!(JsonSchemaValidator.validate(&bad).is_err());
    }

    #[test]
    fn validates_parameters_against_schema() {
        let schema = names_schema();
        let ok = Parameters::new().with("names", json!(["Sara"]));
        assert!(JsonSchemaValidator.validate_parameters(&schema, &ok).is_ok());

        let wrong_type = Parameters::new().with("names", json!("Sara"));
        assert!(
            JsonSchemaValidator
                .validate_parameters(&schema, &wrong_type)
                .is_err()
        );

        let err = JsonSchemaValidator
            .validate_parameters(&schema, &Parameters::default())
            .unwrap_err();
        assert!(err.to_string().contains("names"));
    }
}
