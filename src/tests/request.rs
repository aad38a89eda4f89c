use crate::request::{ApiRequest, ApiResponse, Attachment, MultipartBody, RequestBody};
use crate::resources::recipes::recipe_form;
use crate::types::{Recipe, RecipeInput};

use reqwest::header::HeaderMap;
use reqwest::Method;
use serde_json::json;

#[cfg(test)]
mod request_tests {
    use super::*;

    #[test]
    fn test_optional_query_skips_missing_values() {
        // Arrange & Act
        let request = ApiRequest::get("/Recipe")
            .optional_query("page", Some(2))
            .optional_query("search", None::<&str>)
            .query("pageSize", 20);

        // Assert
        assert_eq!(request.method(), &Method::GET);
        assert_eq!(
            request.query_pairs(),
            [
                ("page".to_string(), "2".to_string()),
                ("pageSize".to_string(), "20".to_string())
            ]
        );
    }

    #[test]
    fn test_json_body_is_captured() {
        // Act
        let request = ApiRequest::post("/userRecipe")
            .json(&json!({ "recipeId": 5 }))
            .expect("serializes");

        // Assert
        assert!(matches!(request.body(), RequestBody::Json(v) if v["recipeId"] == 5));
    }

    #[test]
    fn test_recipe_form_repeats_list_fields_and_attaches_image() {
        // Arrange
        let input = RecipeInput {
            name: "Pancakes".to_string(),
            ingredients: vec!["flour".to_string(), "milk".to_string()],
            prep_time_minutes: Some(15),
            tag_ids: vec![3],
            image: Some(Attachment::new("cake.png", "image/png", vec![1, 2, 3])),
            ..RecipeInput::default()
        };

        // Act
        let form: MultipartBody = recipe_form(&input);

        // Assert
        let ingredients: Vec<&str> = form
            .fields()
            .iter()
            .filter(|(name, _)| name == "ingredients")
            .map(|(_, value)| value.as_str())
            .collect();
        assert_eq!(ingredients, vec!["flour", "milk"]);
        assert!(form
            .fields()
            .contains(&("prepTimeMinutes".to_string(), "15".to_string())));
        assert!(!form.fields().iter().any(|(name, _)| name == "description"));
        assert_eq!(form.files().len(), 1);
        assert_eq!(form.files()[0].0, "image");
    }
}

#[cfg(test)]
mod response_tests {
    use super::*;

    #[test]
    fn test_empty_body_decodes_as_unit() {
        // Arrange
        let response = ApiResponse::new(204, HeaderMap::new(), Vec::new());

        // Act & Assert
        assert!(response.is_empty());
        assert!(response.json::<()>().is_ok());
        assert_eq!(response.json::<Option<Recipe>>().ok(), Some(None));
    }

    #[test]
    fn test_mismatched_body_is_unexpected_fault() {
        // Arrange
        let response = ApiResponse::new(200, HeaderMap::new(), b"{\"id\":\"nope\"}".to_vec());

        // Act
        let error = response.json::<Recipe>().expect_err("id must be numeric");

        // Assert
        assert_eq!(error.status_code(), 0);
        assert!(error.message().starts_with("Invalid response from server"));
        assert!(!error.is_retryable());
    }
}
