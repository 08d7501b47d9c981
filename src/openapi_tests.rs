#[cfg(test)]
mod tests {
    use crate::schemas::ApiDoc;
    use utoipa::OpenApi;

    #[test]
    fn test_openapi_schema_generation() {
        let openapi = ApiDoc::openapi();

        assert!(openapi.components.is_some());
        let components = openapi.components.as_ref().unwrap();

        for schema in [
            "ErrorResponse",
            "HealthResponse",
            "AccountDto",
            "DriverDto",
            "StandingDto",
            "RaceResultDto",
            "SignupRequest",
            "RaceRequestBody",
        ] {
            assert!(
                components.schemas.contains_key(schema),
                "missing schema {}",
                schema
            );
        }

        assert!(serde_json::to_string(&openapi).is_ok());
    }

    #[test]
    fn test_account_schema_hides_password() {
        let openapi = ApiDoc::openapi();
        let components = openapi.components.as_ref().unwrap();
        let account_schema = components.schemas.get("AccountDto").unwrap();

        if let utoipa::openapi::RefOr::T(utoipa::openapi::schema::Schema::Object(obj)) = account_schema {
            let properties = &obj.properties;
            assert!(properties.contains_key("wallet"));
            assert!(properties.contains_key("status"));
            assert!(!properties.keys().any(|k| k.contains("password")));
        } else {
            panic!("AccountDto should be an object schema");
        }
    }

    #[test]
    fn test_error_response_schema_structure() {
        let openapi = ApiDoc::openapi();
        let components = openapi.components.as_ref().unwrap();
        let error_response_schema = components.schemas.get("ErrorResponse").unwrap();

        if let utoipa::openapi::RefOr::T(utoipa::openapi::schema::Schema::Object(obj)) = error_response_schema {
            let properties = &obj.properties;
            assert!(properties.contains_key("error"));
            assert!(properties.contains_key("code"));
            assert!(properties.contains_key("success"));
        } else {
            panic!("ErrorResponse should be an object schema");
        }
    }

    #[test]
    fn test_openapi_paths_cover_the_api() {
        use utoipa::openapi::PathItemType;

        let openapi = ApiDoc::openapi();
        let paths = &openapi.paths.paths;

        let expected = [
            ("/health", PathItemType::Get),
            ("/api/v1/users", PathItemType::Post),
            ("/api/v1/users", PathItemType::Get),
            ("/api/v1/users/{username}", PathItemType::Put),
            ("/api/v1/users/{username}/wallet/debit", PathItemType::Post),
            ("/api/v1/auth/login", PathItemType::Post),
            ("/api/v1/races", PathItemType::Post),
            ("/api/v1/drivers/leaderboard", PathItemType::Get),
            ("/api/v1/drivers/{driver_id}", PathItemType::Delete),
            ("/api/v1/drivers/{driver_id}/hot-streak", PathItemType::Post),
            ("/api/v1/admin/users/{user_id}/suspend", PathItemType::Post),
            ("/api/v1/admin/users", PathItemType::Get),
        ];

        for (path, method) in expected {
            let item = paths
                .get(path)
                .unwrap_or_else(|| panic!("missing path {}", path));
            assert!(
                item.operations.contains_key(&method),
                "missing {:?} {}",
                method,
                path
            );
        }
    }

    #[test]
    fn test_race_endpoint_documents_rejections() {
        let openapi = ApiDoc::openapi();
        let race = openapi.paths.paths.get("/api/v1/races").unwrap();
        let post = race
            .operations
            .get(&utoipa::openapi::PathItemType::Post)
            .unwrap();

        for status in ["200", "400", "403", "404"] {
            assert!(post.responses.responses.contains_key(status));
        }
    }
}
