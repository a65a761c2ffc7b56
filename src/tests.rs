#[cfg(test)]
mod integration_tests {
    use crate::test_utils::test_utils::{
        access_token_for, bearer, seed_user, setup_test_server, ADMIN_EMAIL, ADMIN_PASSWORD,
        EMPLOYEE_EMAIL, EMPLOYEE_PASSWORD,
    };
    use axum::http::header::AUTHORIZATION;
    use axum::http::StatusCode;
    use axum_test::TestServer;
    use model::entities::{contact, network_entity, product, user};
    use rust_decimal::Decimal;
    use sea_orm::{ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, Set};

    /// Create an entity through the API and return its response data
    async fn create_entity(
        server: &TestServer,
        token: &str,
        name: &str,
        supplier: Option<i64>,
        country: &str,
        city: &str,
    ) -> serde_json::Value {
        let payload = serde_json::json!({
            "name": name,
            "supplier": supplier,
            "contact": {
                "email": "contact@example.com",
                "country": country,
                "city": city,
                "street": "Main Street",
                "house_number": "1"
            },
            "products": [
                { "name": "TV", "model": "QX-55", "release_date": "2023-03-01" }
            ]
        });

        let response = server
            .post("/api/v1/network-entities")
            .add_header(AUTHORIZATION, bearer(token))
            .json(&payload)
            .await;
        response.assert_status(StatusCode::CREATED);

        let body: serde_json::Value = response.json();
        assert!(body["success"].as_bool().unwrap());
        body["data"].clone()
    }

    #[tokio::test]
    async fn test_health_check() {
        let (server, _state) = setup_test_server().await;

        let response = server.get("/health").await;

        response.assert_status(StatusCode::OK);
    }

    #[tokio::test]
    async fn test_register_user() {
        let (server, _state) = setup_test_server().await;

        let response = server
            .post("/api/v1/auth/register")
            .json(&serde_json::json!({
                "email": "new.hire@Example.COM",
                "password": "a-strong-password",
                "first_name": "Nadia"
            }))
            .await;

        response.assert_status(StatusCode::CREATED);
        let body: serde_json::Value = response.json();
        assert!(body["success"].as_bool().unwrap());
        // The domain part is normalized before storage
        assert_eq!(body["data"]["email"], "new.hire@example.com");
        assert_eq!(body["data"]["first_name"], "Nadia");
        assert!(body["data"]["id"].as_i64().unwrap() > 0);
        assert!(body["data"].get("password").is_none());
        assert!(body["data"].get("password_hash").is_none());
    }

    #[tokio::test]
    async fn test_register_with_empty_email_creates_no_user() {
        let (server, state) = setup_test_server().await;

        let response = server
            .post("/api/v1/auth/register")
            .json(&serde_json::json!({ "email": "", "password": "whatever" }))
            .await;

        response.assert_status(StatusCode::BAD_REQUEST);
        let body: serde_json::Value = response.json();
        assert_eq!(body["code"], "VALIDATION_ERROR");
        assert!(body["fields"]["email"].is_array());

        // Only the two seeded users exist
        let users = user::Entity::find().all(&state.db).await.unwrap();
        assert_eq!(users.len(), 2);
    }

    #[tokio::test]
    async fn test_register_with_duplicate_email() {
        let (server, _state) = setup_test_server().await;

        let response = server
            .post("/api/v1/auth/register")
            .json(&serde_json::json!({
                "email": EMPLOYEE_EMAIL,
                "password": "another-password"
            }))
            .await;

        response.assert_status(StatusCode::BAD_REQUEST);
        let body: serde_json::Value = response.json();
        assert!(body["fields"]["email"].is_array());
    }

    #[tokio::test]
    async fn test_successful_login() {
        let (server, state) = setup_test_server().await;

        let response = server
            .post("/api/v1/auth/login")
            .json(&serde_json::json!({
                "email": EMPLOYEE_EMAIL,
                "password": EMPLOYEE_PASSWORD
            }))
            .await;

        response.assert_status(StatusCode::OK);
        let body: serde_json::Value = response.json();
        assert!(body["success"].as_bool().unwrap());

        // A successful login stamps last_login
        let employee = user::Entity::find()
            .filter(user::Column::Email.eq(EMPLOYEE_EMAIL))
            .one(&state.db)
            .await
            .unwrap()
            .unwrap();
        assert!(employee.last_login.is_some());
    }

    #[tokio::test]
    async fn test_login_with_wrong_password() {
        let (server, state) = setup_test_server().await;

        let response = server
            .post("/api/v1/auth/login")
            .json(&serde_json::json!({
                "email": EMPLOYEE_EMAIL,
                "password": "wrongpass"
            }))
            .await;

        response.assert_status(StatusCode::UNAUTHORIZED);
        let body: serde_json::Value = response.json();
        assert_eq!(body["code"], "INVALID_CREDENTIALS");

        // No login happened, so no last_login stamp
        let employee = user::Entity::find()
            .filter(user::Column::Email.eq(EMPLOYEE_EMAIL))
            .one(&state.db)
            .await
            .unwrap()
            .unwrap();
        assert!(employee.last_login.is_none());
    }

    #[tokio::test]
    async fn test_logout() {
        let (server, _state) = setup_test_server().await;

        let response = server.post("/api/v1/auth/logout").await;

        response.assert_status(StatusCode::OK);
    }

    #[tokio::test]
    async fn test_token_pair_embeds_identity_claims() {
        let (server, state) = setup_test_server().await;

        let response = server
            .post("/api/v1/auth/token")
            .json(&serde_json::json!({
                "email": EMPLOYEE_EMAIL,
                "password": EMPLOYEE_PASSWORD
            }))
            .await;

        response.assert_status(StatusCode::OK);
        let body: serde_json::Value = response.json();
        let access = body["data"]["access"].as_str().unwrap();
        let refresh = body["data"]["refresh"].as_str().unwrap();
        assert!(!access.is_empty());
        assert!(!refresh.is_empty());

        let claims =
            crate::auth::decode_token(&state.auth, access, crate::auth::TOKEN_TYPE_ACCESS)
                .unwrap();
        assert_eq!(claims.email, EMPLOYEE_EMAIL);
        assert!(claims.sub > 0);
    }

    #[tokio::test]
    async fn test_token_with_wrong_password_is_rejected() {
        let (server, _state) = setup_test_server().await;

        let response = server
            .post("/api/v1/auth/token")
            .json(&serde_json::json!({
                "email": EMPLOYEE_EMAIL,
                "password": "wrongpass"
            }))
            .await;

        response.assert_status(StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_refresh_token_issues_new_pair() {
        let (server, _state) = setup_test_server().await;

        let response = server
            .post("/api/v1/auth/token")
            .json(&serde_json::json!({
                "email": EMPLOYEE_EMAIL,
                "password": EMPLOYEE_PASSWORD
            }))
            .await;
        response.assert_status(StatusCode::OK);
        let body: serde_json::Value = response.json();
        let refresh = body["data"]["refresh"].as_str().unwrap().to_string();
        let access = body["data"]["access"].as_str().unwrap().to_string();

        let response = server
            .post("/api/v1/auth/token/refresh")
            .json(&serde_json::json!({ "refresh": refresh }))
            .await;
        response.assert_status(StatusCode::OK);
        let body: serde_json::Value = response.json();
        assert!(!body["data"]["access"].as_str().unwrap().is_empty());

        // An access token is not accepted as a refresh token
        let response = server
            .post("/api/v1/auth/token/refresh")
            .json(&serde_json::json!({ "refresh": access }))
            .await;
        response.assert_status(StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_entity_routes_require_authentication() {
        let (server, _state) = setup_test_server().await;

        let response = server.get("/api/v1/network-entities").await;

        response.assert_status(StatusCode::UNAUTHORIZED);
        let body: serde_json::Value = response.json();
        assert_eq!(body["code"], "NOT_AUTHENTICATED");
    }

    #[tokio::test]
    async fn test_inactive_user_is_rejected() {
        let (server, state) = setup_test_server().await;

        let token = access_token_for(&server, EMPLOYEE_EMAIL, EMPLOYEE_PASSWORD).await;

        // Deactivate the employee after the token was issued
        let employee = user::Entity::find()
            .filter(user::Column::Email.eq(EMPLOYEE_EMAIL))
            .one(&state.db)
            .await
            .unwrap()
            .unwrap();
        let mut employee_active: user::ActiveModel = employee.into();
        employee_active.is_active = Set(false);
        employee_active.update(&state.db).await.unwrap();

        let response = server
            .get("/api/v1/network-entities")
            .add_header(AUTHORIZATION, bearer(&token))
            .await;

        response.assert_status(StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_token_endpoint_rejects_inactive_user() {
        let (server, state) = setup_test_server().await;

        seed_user(&state.db, "former@example.com", "former-pass-1", false, false).await;

        let response = server
            .post("/api/v1/auth/token")
            .json(&serde_json::json!({
                "email": "former@example.com",
                "password": "former-pass-1"
            }))
            .await;

        response.assert_status(StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_create_entity_without_supplier() {
        let (server, _state) = setup_test_server().await;
        let token = access_token_for(&server, EMPLOYEE_EMAIL, EMPLOYEE_PASSWORD).await;

        let data = create_entity(&server, &token, "Quartz Components", None, "Japan", "Osaka").await;

        assert_eq!(data["level"], 0);
        assert_eq!(data["supplier"], serde_json::Value::Null);
        assert_eq!(data["debt"], "0");
        assert_eq!(data["contact"]["country"], "Japan");
        assert_eq!(data["products"].as_array().unwrap().len(), 1);
        assert_eq!(data["products"][0]["model"], "QX-55");
    }

    #[tokio::test]
    async fn test_entity_level_follows_supplier_chain() {
        let (server, _state) = setup_test_server().await;
        let token = access_token_for(&server, EMPLOYEE_EMAIL, EMPLOYEE_PASSWORD).await;

        let factory =
            create_entity(&server, &token, "Factory", None, "Japan", "Osaka").await;
        let distributor = create_entity(
            &server,
            &token,
            "Distributor",
            factory["id"].as_i64(),
            "Germany",
            "Berlin",
        )
        .await;
        let wholesaler = create_entity(
            &server,
            &token,
            "Wholesaler",
            distributor["id"].as_i64(),
            "Germany",
            "Hamburg",
        )
        .await;
        let retail = create_entity(
            &server,
            &token,
            "Retail point",
            wholesaler["id"].as_i64(),
            "France",
            "Lyon",
        )
        .await;

        assert_eq!(factory["level"], 0);
        assert_eq!(distributor["level"], 1);
        assert_eq!(wholesaler["level"], 2);
        // Deeper ancestry still reads 2
        assert_eq!(retail["level"], 2);

        // The list endpoint derives the same levels
        let response = server
            .get("/api/v1/network-entities")
            .add_header(AUTHORIZATION, bearer(&token))
            .await;
        response.assert_status(StatusCode::OK);
        let body: serde_json::Value = response.json();
        let entities = body["data"].as_array().unwrap();
        assert_eq!(entities.len(), 4);
        let level_of = |name: &str| {
            entities
                .iter()
                .find(|e| e["name"] == name)
                .unwrap()["level"]
                .as_i64()
                .unwrap()
        };
        assert_eq!(level_of("Factory"), 0);
        assert_eq!(level_of("Distributor"), 1);
        assert_eq!(level_of("Wholesaler"), 2);
        assert_eq!(level_of("Retail point"), 2);
    }

    #[tokio::test]
    async fn test_create_with_unknown_supplier_is_rejected() {
        let (server, state) = setup_test_server().await;
        let token = access_token_for(&server, EMPLOYEE_EMAIL, EMPLOYEE_PASSWORD).await;

        let response = server
            .post("/api/v1/network-entities")
            .add_header(AUTHORIZATION, bearer(&token))
            .json(&serde_json::json!({
                "name": "Orphaned",
                "supplier": 9999,
                "contact": {
                    "email": "contact@example.com",
                    "country": "Japan",
                    "city": "Osaka",
                    "street": "Main Street",
                    "house_number": "1"
                },
                "products": []
            }))
            .await;

        response.assert_status(StatusCode::BAD_REQUEST);
        let body: serde_json::Value = response.json();
        assert_eq!(body["code"], "VALIDATION_ERROR");
        assert!(body["fields"]["supplier"].is_array());

        // Nothing was written
        let entities = network_entity::Entity::find().all(&state.db).await.unwrap();
        assert!(entities.is_empty());
    }

    #[tokio::test]
    async fn test_create_with_invalid_contact_email() {
        let (server, state) = setup_test_server().await;
        let token = access_token_for(&server, EMPLOYEE_EMAIL, EMPLOYEE_PASSWORD).await;

        let response = server
            .post("/api/v1/network-entities")
            .add_header(AUTHORIZATION, bearer(&token))
            .json(&serde_json::json!({
                "name": "Bad Contact",
                "supplier": null,
                "contact": {
                    "email": "not-an-email",
                    "country": "Japan",
                    "city": "Osaka",
                    "street": "Main Street",
                    "house_number": "1"
                },
                "products": []
            }))
            .await;

        response.assert_status(StatusCode::BAD_REQUEST);
        let body: serde_json::Value = response.json();
        assert!(body["fields"]["contact.email"].is_array());

        let contacts = contact::Entity::find().all(&state.db).await.unwrap();
        assert!(contacts.is_empty());
    }

    #[tokio::test]
    async fn test_debt_is_not_client_settable() {
        let (server, _state) = setup_test_server().await;
        let token = access_token_for(&server, EMPLOYEE_EMAIL, EMPLOYEE_PASSWORD).await;

        let response = server
            .post("/api/v1/network-entities")
            .add_header(AUTHORIZATION, bearer(&token))
            .json(&serde_json::json!({
                "name": "Debt Dodger",
                "supplier": null,
                "debt": "999.99",
                "contact": {
                    "email": "contact@example.com",
                    "country": "Japan",
                    "city": "Osaka",
                    "street": "Main Street",
                    "house_number": "1"
                },
                "products": []
            }))
            .await;

        // The debt field is simply ignored
        response.assert_status(StatusCode::CREATED);
        let body: serde_json::Value = response.json();
        assert_eq!(body["data"]["debt"], "0");
    }

    #[tokio::test]
    async fn test_filter_entities_by_contact_country() {
        let (server, _state) = setup_test_server().await;
        let token = access_token_for(&server, EMPLOYEE_EMAIL, EMPLOYEE_PASSWORD).await;

        create_entity(&server, &token, "Nippon Parts", None, "Japan", "Osaka").await;
        create_entity(&server, &token, "Berlin Supply", None, "Germany", "Berlin").await;

        let response = server
            .get("/api/v1/network-entities")
            .add_query_param("country", "Germany")
            .add_header(AUTHORIZATION, bearer(&token))
            .await;

        response.assert_status(StatusCode::OK);
        let body: serde_json::Value = response.json();
        let entities = body["data"].as_array().unwrap();
        assert_eq!(entities.len(), 1);
        assert_eq!(entities[0]["name"], "Berlin Supply");
    }

    #[tokio::test]
    async fn test_get_entity_not_found() {
        let (server, _state) = setup_test_server().await;
        let token = access_token_for(&server, EMPLOYEE_EMAIL, EMPLOYEE_PASSWORD).await;

        let response = server
            .get("/api/v1/network-entities/999")
            .add_header(AUTHORIZATION, bearer(&token))
            .await;

        response.assert_status(StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_update_persists_new_supplier_and_keeps_omitted_products() {
        let (server, _state) = setup_test_server().await;
        let token = access_token_for(&server, EMPLOYEE_EMAIL, EMPLOYEE_PASSWORD).await;

        let supplier =
            create_entity(&server, &token, "Factory", None, "Japan", "Osaka").await;
        let entity =
            create_entity(&server, &token, "Retailer", None, "Germany", "Berlin").await;
        let entity_id = entity["id"].as_i64().unwrap();
        let existing_product_id = entity["products"][0]["id"].as_i64().unwrap();

        let response = server
            .put(&format!("/api/v1/network-entities/{entity_id}"))
            .add_header(AUTHORIZATION, bearer(&token))
            .json(&serde_json::json!({
                "supplier": supplier["id"],
                "products": [
                    { "name": "Laptop", "model": "L-3", "release_date": "2024-01-15" }
                ]
            }))
            .await;

        response.assert_status(StatusCode::OK);
        let body: serde_json::Value = response.json();
        let data = &body["data"];

        // The new supplier relation is persisted and the level follows
        assert_eq!(data["supplier"], supplier["id"]);
        assert_eq!(data["level"], 1);

        // The omitted product is untouched, the submitted one was added
        let products = data["products"].as_array().unwrap();
        assert_eq!(products.len(), 2);
        let untouched = products
            .iter()
            .find(|p| p["id"].as_i64() == Some(existing_product_id))
            .expect("omitted product must survive the update");
        assert_eq!(untouched["name"], "TV");
        assert!(products.iter().any(|p| p["name"] == "Laptop"));
    }

    #[tokio::test]
    async fn test_update_product_by_id() {
        let (server, _state) = setup_test_server().await;
        let token = access_token_for(&server, EMPLOYEE_EMAIL, EMPLOYEE_PASSWORD).await;

        let entity =
            create_entity(&server, &token, "Retailer", None, "Germany", "Berlin").await;
        let entity_id = entity["id"].as_i64().unwrap();
        let product_id = entity["products"][0]["id"].as_i64().unwrap();

        let response = server
            .put(&format!("/api/v1/network-entities/{entity_id}"))
            .add_header(AUTHORIZATION, bearer(&token))
            .json(&serde_json::json!({
                "products": [
                    { "id": product_id, "name": "TV", "model": "QX-65", "release_date": "2024-09-01" }
                ]
            }))
            .await;

        response.assert_status(StatusCode::OK);
        let body: serde_json::Value = response.json();
        let products = body["data"]["products"].as_array().unwrap();
        assert_eq!(products.len(), 1);
        assert_eq!(products[0]["id"].as_i64(), Some(product_id));
        assert_eq!(products[0]["model"], "QX-65");
    }

    #[tokio::test]
    async fn test_update_rejects_foreign_product_id() {
        let (server, _state) = setup_test_server().await;
        let token = access_token_for(&server, EMPLOYEE_EMAIL, EMPLOYEE_PASSWORD).await;

        let first = create_entity(&server, &token, "First", None, "Japan", "Osaka").await;
        let second = create_entity(&server, &token, "Second", None, "Germany", "Berlin").await;
        let second_id = second["id"].as_i64().unwrap();
        let foreign_product_id = first["products"][0]["id"].as_i64().unwrap();

        let response = server
            .put(&format!("/api/v1/network-entities/{second_id}"))
            .add_header(AUTHORIZATION, bearer(&token))
            .json(&serde_json::json!({
                "products": [
                    { "id": foreign_product_id, "name": "TV", "model": "QX-55", "release_date": "2023-03-01" }
                ]
            }))
            .await;

        response.assert_status(StatusCode::BAD_REQUEST);
        let body: serde_json::Value = response.json();
        assert!(body["fields"]["products"].is_array());
    }

    #[tokio::test]
    async fn test_update_contact_overwrites_fields() {
        let (server, _state) = setup_test_server().await;
        let token = access_token_for(&server, EMPLOYEE_EMAIL, EMPLOYEE_PASSWORD).await;

        let entity =
            create_entity(&server, &token, "Retailer", None, "Germany", "Berlin").await;
        let entity_id = entity["id"].as_i64().unwrap();
        let contact_id = entity["contact"]["id"].as_i64().unwrap();

        let response = server
            .put(&format!("/api/v1/network-entities/{entity_id}"))
            .add_header(AUTHORIZATION, bearer(&token))
            .json(&serde_json::json!({
                "contact": {
                    "email": "moved@example.com",
                    "country": "Austria",
                    "city": "Vienna",
                    "street": "Ringstrasse",
                    "house_number": "7"
                }
            }))
            .await;

        response.assert_status(StatusCode::OK);
        let body: serde_json::Value = response.json();
        let contact_data = &body["data"]["contact"];
        // Overwritten in place, not replaced by a new row
        assert_eq!(contact_data["id"].as_i64(), Some(contact_id));
        assert_eq!(contact_data["email"], "moved@example.com");
        assert_eq!(contact_data["city"], "Vienna");
    }

    #[tokio::test]
    async fn test_delete_supplier_nulls_dependents_and_cascades() {
        let (server, state) = setup_test_server().await;
        let token = access_token_for(&server, EMPLOYEE_EMAIL, EMPLOYEE_PASSWORD).await;

        let supplier =
            create_entity(&server, &token, "Factory", None, "Japan", "Osaka").await;
        let supplier_id = supplier["id"].as_i64().unwrap();
        let dependent = create_entity(
            &server,
            &token,
            "Retailer",
            Some(supplier_id),
            "Germany",
            "Berlin",
        )
        .await;
        let dependent_id = dependent["id"].as_i64().unwrap();
        assert_eq!(dependent["level"], 1);

        let response = server
            .delete(&format!("/api/v1/network-entities/{supplier_id}"))
            .add_header(AUTHORIZATION, bearer(&token))
            .await;
        response.assert_status(StatusCode::OK);

        // The dependent lost its supplier and its derived level reads 0
        let response = server
            .get(&format!("/api/v1/network-entities/{dependent_id}"))
            .add_header(AUTHORIZATION, bearer(&token))
            .await;
        response.assert_status(StatusCode::OK);
        let body: serde_json::Value = response.json();
        assert_eq!(body["data"]["supplier"], serde_json::Value::Null);
        assert_eq!(body["data"]["level"], 0);

        // The deleted entity's contact and products cascaded away
        let orphaned_contacts = contact::Entity::find()
            .filter(contact::Column::NetworkEntityId.eq(supplier_id as i32))
            .all(&state.db)
            .await
            .unwrap();
        assert!(orphaned_contacts.is_empty());
        let orphaned_products = product::Entity::find()
            .filter(product::Column::NetworkEntityId.eq(supplier_id as i32))
            .all(&state.db)
            .await
            .unwrap();
        assert!(orphaned_products.is_empty());
    }

    #[tokio::test]
    async fn test_admin_routes_require_staff() {
        let (server, _state) = setup_test_server().await;

        let employee_token = access_token_for(&server, EMPLOYEE_EMAIL, EMPLOYEE_PASSWORD).await;
        let response = server
            .get("/api/v1/admin/network-entities")
            .add_header(AUTHORIZATION, bearer(&employee_token))
            .await;
        response.assert_status(StatusCode::FORBIDDEN);

        let admin_token = access_token_for(&server, ADMIN_EMAIL, ADMIN_PASSWORD).await;
        let response = server
            .get("/api/v1/admin/network-entities")
            .add_header(AUTHORIZATION, bearer(&admin_token))
            .await;
        response.assert_status(StatusCode::OK);
    }

    #[tokio::test]
    async fn test_admin_filter_by_contact_city() {
        let (server, _state) = setup_test_server().await;
        let employee_token = access_token_for(&server, EMPLOYEE_EMAIL, EMPLOYEE_PASSWORD).await;
        let admin_token = access_token_for(&server, ADMIN_EMAIL, ADMIN_PASSWORD).await;

        create_entity(&server, &employee_token, "Berlin Supply", None, "Germany", "Berlin").await;
        create_entity(&server, &employee_token, "Hamburg Supply", None, "Germany", "Hamburg").await;

        let response = server
            .get("/api/v1/admin/network-entities")
            .add_query_param("city", "Hamburg")
            .add_header(AUTHORIZATION, bearer(&admin_token))
            .await;

        response.assert_status(StatusCode::OK);
        let body: serde_json::Value = response.json();
        let entities = body["data"].as_array().unwrap();
        assert_eq!(entities.len(), 1);
        assert_eq!(entities[0]["name"], "Hamburg Supply");
    }

    #[tokio::test]
    async fn test_admin_clear_debt() {
        let (server, state) = setup_test_server().await;
        let employee_token = access_token_for(&server, EMPLOYEE_EMAIL, EMPLOYEE_PASSWORD).await;
        let admin_token = access_token_for(&server, ADMIN_EMAIL, ADMIN_PASSWORD).await;

        let first = create_entity(&server, &employee_token, "First", None, "Japan", "Osaka").await;
        let second =
            create_entity(&server, &employee_token, "Second", None, "Germany", "Berlin").await;
        let third =
            create_entity(&server, &employee_token, "Third", None, "France", "Lyon").await;

        // Seed debts directly; the API never accepts debt from clients
        for data in [&first, &second, &third] {
            let id = data["id"].as_i64().unwrap() as i32;
            let entity = network_entity::Entity::find_by_id(id)
                .one(&state.db)
                .await
                .unwrap()
                .unwrap();
            let mut entity_active: network_entity::ActiveModel = entity.into();
            entity_active.debt = Set(Decimal::new(50000, 2)); // 500.00
            entity_active.update(&state.db).await.unwrap();
        }

        let response = server
            .post("/api/v1/admin/network-entities/clear-debt")
            .add_header(AUTHORIZATION, bearer(&admin_token))
            .json(&serde_json::json!({
                "ids": [first["id"], second["id"]]
            }))
            .await;

        response.assert_status(StatusCode::OK);
        let body: serde_json::Value = response.json();
        assert_eq!(body["data"].as_u64(), Some(2));

        // The selected entities are zeroed, the third keeps its debt
        let entities = network_entity::Entity::find().all(&state.db).await.unwrap();
        let debt_of = |id: i64| {
            entities
                .iter()
                .find(|e| e.id as i64 == id)
                .unwrap()
                .debt
        };
        assert_eq!(debt_of(first["id"].as_i64().unwrap()), Decimal::ZERO);
        assert_eq!(debt_of(second["id"].as_i64().unwrap()), Decimal::ZERO);
        assert_eq!(
            debt_of(third["id"].as_i64().unwrap()),
            Decimal::new(50000, 2)
        );
    }

    #[tokio::test]
    async fn test_admin_clear_debt_rejects_empty_selection() {
        let (server, _state) = setup_test_server().await;
        let admin_token = access_token_for(&server, ADMIN_EMAIL, ADMIN_PASSWORD).await;

        let response = server
            .post("/api/v1/admin/network-entities/clear-debt")
            .add_header(AUTHORIZATION, bearer(&admin_token))
            .json(&serde_json::json!({ "ids": [] }))
            .await;

        response.assert_status(StatusCode::BAD_REQUEST);
    }
}
