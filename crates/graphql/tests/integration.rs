//! Integration tests for the quill-graphql crate.
//!
//! Every test drives the public [`Engine`] with a [`MemoryStore`] behind it,
//! the same way the CLI does.

#![allow(clippy::unwrap_used, clippy::expect_used)]

use std::sync::Arc;

use {
    async_trait::async_trait,
    quill_graphql::{Engine, EngineOptions, ErrorCode, GraphQlRequest, GraphQlResponse},
    quill_store::{
        DataStore, MemberTier, MemberTierId, MemoryStore, NewPost, NewProfile, NewUser, Post,
        PostFilter, PostPatch, Profile, ProfileKey, ProfilePatch, StoreError, StoreResult,
        SubscriptionEdge, User, UserFilter, UserPatch,
    },
    serde_json::{Value, json},
};

// ── Failing store ───────────────────────────────────────────────────────────

/// Delegates to a [`MemoryStore`] but reports `find_user` and `find_posts`
/// as unavailable.
struct FlakyStore(MemoryStore);

fn unavailable<T>(operation: &str) -> StoreResult<T> {
    Err(StoreError::Unavailable(format!("{operation} timed out")))
}

#[async_trait]
impl DataStore for FlakyStore {
    async fn find_users(&self, filter: UserFilter) -> StoreResult<Vec<User>> {
        self.0.find_users(filter).await
    }

    async fn find_user(&self, _id: &str) -> StoreResult<Option<User>> {
        unavailable("find_user")
    }

    async fn create_user(&self, data: NewUser) -> StoreResult<User> {
        self.0.create_user(data).await
    }

    async fn update_user(&self, id: &str, patch: UserPatch) -> StoreResult<User> {
        self.0.update_user(id, patch).await
    }

    async fn delete_user(&self, id: &str) -> StoreResult<User> {
        self.0.delete_user(id).await
    }

    async fn find_posts(&self, _filter: PostFilter) -> StoreResult<Vec<Post>> {
        unavailable("find_posts")
    }

    async fn find_post(&self, id: &str) -> StoreResult<Option<Post>> {
        self.0.find_post(id).await
    }

    async fn create_post(&self, data: NewPost) -> StoreResult<Post> {
        self.0.create_post(data).await
    }

    async fn update_post(&self, id: &str, patch: PostPatch) -> StoreResult<Post> {
        self.0.update_post(id, patch).await
    }

    async fn delete_post(&self, id: &str) -> StoreResult<Post> {
        self.0.delete_post(id).await
    }

    async fn find_profiles(&self) -> StoreResult<Vec<Profile>> {
        self.0.find_profiles().await
    }

    async fn find_profile(&self, key: ProfileKey) -> StoreResult<Option<Profile>> {
        self.0.find_profile(key).await
    }

    async fn create_profile(&self, data: NewProfile) -> StoreResult<Profile> {
        self.0.create_profile(data).await
    }

    async fn update_profile(&self, id: &str, patch: ProfilePatch) -> StoreResult<Profile> {
        self.0.update_profile(id, patch).await
    }

    async fn delete_profile(&self, id: &str) -> StoreResult<Profile> {
        self.0.delete_profile(id).await
    }

    async fn find_member_tiers(&self) -> StoreResult<Vec<MemberTier>> {
        self.0.find_member_tiers().await
    }

    async fn find_member_tier(&self, id: MemberTierId) -> StoreResult<Option<MemberTier>> {
        self.0.find_member_tier(id).await
    }

    async fn create_subscription(&self, edge: SubscriptionEdge) -> StoreResult<SubscriptionEdge> {
        self.0.create_subscription(edge).await
    }

    async fn delete_subscription(&self, edge: SubscriptionEdge) -> StoreResult<SubscriptionEdge> {
        self.0.delete_subscription(edge).await
    }
}

// ── Test helpers ────────────────────────────────────────────────────────────

const MISSING: &str = "3f2c1a9e-5b7d-4e8f-9a0b-1c2d3e4f5a6b";

fn build_engine() -> (Engine, Arc<MemoryStore>) {
    let store = Arc::new(MemoryStore::new());
    (Engine::new(store.clone()), store)
}

async fn run(engine: &Engine, query: &str, variables: Value) -> GraphQlResponse {
    engine
        .execute(GraphQlRequest::new(query).variables(variables))
        .await
}

async fn run_ok(engine: &Engine, query: &str, variables: Value) -> Value {
    let response = run(engine, query, variables).await;
    assert!(response.is_ok(), "unexpected errors: {:?}", response.errors);
    response.data().clone()
}

async fn create_user(engine: &Engine, name: &str) -> String {
    let data = run_ok(
        engine,
        "mutation($dto: CreateUserInput!) { createUser(dto: $dto) { id } }",
        json!({ "dto": { "name": name, "balance": 10.5 } }),
    )
    .await;
    data["createUser"]["id"].as_str().unwrap().to_string()
}

async fn create_post(engine: &Engine, author: &str, title: &str) -> String {
    let data = run_ok(
        engine,
        "mutation($dto: CreatePostInput!) { createPost(dto: $dto) { id } }",
        json!({ "dto": { "title": title, "content": "body", "authorId": author } }),
    )
    .await;
    data["createPost"]["id"].as_str().unwrap().to_string()
}

async fn create_profile(engine: &Engine, user: &str) -> GraphQlResponse {
    run(
        engine,
        "mutation($dto: CreateProfileInput!) { createProfile(dto: $dto) { id memberTierId } }",
        json!({ "dto": {
            "userId": user,
            "isMale": true,
            "yearOfBirth": 1990,
            "memberTierId": "business",
        } }),
    )
    .await
}

fn nested_subscribers(levels: usize) -> String {
    let mut query = String::from("{ users { ");
    query.push_str(&"subscribedToUser { ".repeat(levels));
    query.push_str("id");
    query.push_str(&" }".repeat(levels + 2));
    query
}

// ── Depth guard ─────────────────────────────────────────────────────────────

#[tokio::test]
async fn depth_five_is_accepted() {
    let (engine, _) = build_engine();
    create_user(&engine, "alice").await;
    let response = run(&engine, &nested_subscribers(4), json!({})).await;
    assert!(response.is_ok(), "{:?}", response.errors);
    assert_eq!(response.data()["users"][0]["subscribedToUser"], json!([]));
}

#[tokio::test]
async fn depth_six_is_rejected_without_data() {
    let (engine, store) = build_engine();
    store.reset_calls();
    let response = run(&engine, &nested_subscribers(5), json!({})).await;
    assert!(response.data.is_none());
    assert_eq!(response.errors.len(), 1);
    assert_eq!(response.errors[0].code(), ErrorCode::DepthLimitExceeded);
    assert_eq!(
        response.errors[0].message,
        "'' exceeds maximum operation depth of 5"
    );
    assert!(store.calls().is_empty());
}

#[tokio::test]
async fn typename_at_depth_six_is_rejected() {
    let (engine, store) = build_engine();
    create_user(&engine, "alice").await;
    store.reset_calls();
    let query = nested_subscribers(5).replacen("id", "__typename", 1);
    let response = run(&engine, &query, json!({})).await;
    assert!(response.data.is_none());
    assert_eq!(response.errors[0].code(), ErrorCode::DepthLimitExceeded);
    assert!(store.calls().is_empty());
}

#[tokio::test]
async fn depth_counts_through_fragments() {
    let (engine, _) = build_engine();
    let query = "query Deep { users { ...A } }
        fragment A on User { subscribedToUser { ...B } }
        fragment B on User { subscribedToUser { subscribedToUser { subscribedToUser { \
                 subscribedToUser { id } } } } }";
    let response = run(&engine, query, json!({})).await;
    assert!(response.data.is_none());
    assert_eq!(
        response.errors[0].message,
        "'Deep' exceeds maximum operation depth of 5"
    );
}

#[tokio::test]
async fn configured_limit_replaces_default() {
    let store: Arc<dyn DataStore> = Arc::new(MemoryStore::new());
    let engine = Engine::with_options(store, EngineOptions {
        max_depth: 8,
        concurrent_fields: true,
    });
    let response = run(&engine, &nested_subscribers(6), json!({})).await;
    assert!(response.is_ok(), "{:?}", response.errors);
}

// ── Queries ─────────────────────────────────────────────────────────────────

#[tokio::test]
async fn member_tiers_are_seeded() {
    let (engine, _) = build_engine();
    let data = run_ok(
        &engine,
        "{ memberTiers { id discount postsLimitPerMonth } }",
        json!({}),
    )
    .await;
    let tiers = data["memberTiers"].as_array().unwrap();
    assert_eq!(tiers.len(), 2);
    assert_eq!(tiers[0]["id"], "basic");
    assert_eq!(tiers[1]["id"], "business");
}

#[tokio::test]
async fn member_tier_by_enum_literal() {
    let (engine, _) = build_engine();
    let data = run_ok(&engine, "{ memberTier(id: business) { id } }", json!({})).await;
    assert_eq!(data, json!({ "memberTier": { "id": "business" } }));
}

#[tokio::test]
async fn missing_user_is_null_without_errors() {
    let (engine, _) = build_engine();
    let data = run_ok(
        &engine,
        "query($id: UUID!) { user(id: $id) { id name } }",
        json!({ "id": MISSING }),
    )
    .await;
    assert_eq!(data, json!({ "user": null }));
}

#[tokio::test]
async fn user_with_relations_returns_only_requested_keys() {
    let (engine, _) = build_engine();
    let alice = create_user(&engine, "alice").await;
    let first = create_post(&engine, &alice, "first").await;
    let second = create_post(&engine, &alice, "second").await;
    assert!(create_profile(&engine, &alice).await.is_ok());

    let data = run_ok(
        &engine,
        "query($id: UUID!) { user(id: $id) { name posts { id title } profile { yearOfBirth \
         memberTier { discount } } } }",
        json!({ "id": alice }),
    )
    .await;
    assert_eq!(
        data,
        json!({ "user": {
            "name": "alice",
            "posts": [
                { "id": first, "title": "first" },
                { "id": second, "title": "second" },
            ],
            "profile": { "yearOfBirth": 1990, "memberTier": { "discount": 7.7 } },
        } })
    );
    assert_eq!(
        data["user"].as_object().unwrap().keys().collect::<Vec<_>>(),
        vec!["name", "posts", "profile"]
    );
}

#[tokio::test]
async fn aliases_and_typename() {
    let (engine, _) = build_engine();
    let alice = create_user(&engine, "alice").await;
    let data = run_ok(
        &engine,
        "query($id: UUID!) { who: user(id: $id) { kind: __typename handle: name } __typename }",
        json!({ "id": alice }),
    )
    .await;
    assert_eq!(
        data,
        json!({ "who": { "kind": "User", "handle": "alice" }, "__typename": "Query" })
    );
}

#[tokio::test]
async fn fragments_and_directives() {
    let (engine, _) = build_engine();
    create_user(&engine, "alice").await;
    let query = "query($withBalance: Boolean!) {
        users { ...Basics balance @include(if: $withBalance) id @skip(if: true) }
    }
    fragment Basics on User { name }";

    let data = run_ok(&engine, query, json!({ "withBalance": false })).await;
    assert_eq!(data, json!({ "users": [{ "name": "alice" }] }));

    let data = run_ok(&engine, query, json!({ "withBalance": true })).await;
    assert_eq!(data, json!({ "users": [{ "name": "alice", "balance": 10.5 }] }));
}

#[tokio::test]
async fn follow_edges_resolve_in_both_directions() {
    let (engine, _) = build_engine();
    let alice = create_user(&engine, "alice").await;
    let bob = create_user(&engine, "bob").await;
    run_ok(
        &engine,
        "mutation($u: UUID!, $a: UUID!) { subscribeTo(userId: $u, authorId: $a) { name } }",
        json!({ "u": alice, "a": bob }),
    )
    .await;

    let data = run_ok(
        &engine,
        "query($a: UUID!, $b: UUID!) {
            alice: user(id: $a) { userSubscribedTo { name } subscribedToUser { name } }
            bob: user(id: $b) { userSubscribedTo { name } subscribedToUser { name } }
        }",
        json!({ "a": alice, "b": bob }),
    )
    .await;
    assert_eq!(
        data,
        json!({
            "alice": { "userSubscribedTo": [{ "name": "bob" }], "subscribedToUser": [] },
            "bob": { "userSubscribedTo": [], "subscribedToUser": [{ "name": "alice" }] },
        })
    );
}

#[tokio::test]
async fn relation_lookups_run_once_per_parent() {
    let (engine, store) = build_engine();
    for name in ["alice", "bob", "carol"] {
        create_user(&engine, name).await;
    }
    store.reset_calls();

    run_ok(&engine, "{ users { profile { id } } }", json!({})).await;
    assert_eq!(store.call_count("find_users"), 1);
    assert_eq!(store.call_count("find_profile"), 3);
}

#[tokio::test]
async fn unrequested_relations_are_not_loaded() {
    let (engine, store) = build_engine();
    create_user(&engine, "alice").await;
    store.reset_calls();

    run_ok(&engine, "{ users { id name } }", json!({})).await;
    assert_eq!(store.calls(), vec!["find_users"]);
}

// ── Mutations ───────────────────────────────────────────────────────────────

#[tokio::test]
async fn change_user_then_query() {
    let (engine, _) = build_engine();
    let alice = create_user(&engine, "alice").await;
    let data = run_ok(
        &engine,
        "mutation($id: UUID!) { changeUser(id: $id, dto: { name: \"alicia\" }) { name balance } }",
        json!({ "id": alice }),
    )
    .await;
    assert_eq!(data, json!({ "changeUser": { "name": "alicia", "balance": 10.5 } }));

    let data = run_ok(
        &engine,
        "query($id: UUID!) { user(id: $id) { name } }",
        json!({ "id": alice }),
    )
    .await;
    assert_eq!(data["user"]["name"], "alicia");
}

#[tokio::test]
async fn duplicate_profile_is_a_constraint_violation() {
    let (engine, store) = build_engine();
    let alice = create_user(&engine, "alice").await;
    let first = create_profile(&engine, &alice).await;
    assert!(first.is_ok());
    assert_eq!(first.data()["createProfile"]["memberTierId"], "business");

    let second = create_profile(&engine, &alice).await;
    assert_eq!(second.data(), &json!({ "createProfile": null }));
    assert_eq!(second.errors.len(), 1);
    assert_eq!(second.errors[0].code(), ErrorCode::ConstraintViolation);
    assert_eq!(
        serde_json::to_value(&second.errors[0].path).unwrap(),
        json!(["createProfile"])
    );
    assert_eq!(store.snapshot().await.profiles.len(), 1);
}

#[tokio::test]
async fn unsubscribe_then_subscribe() {
    let (engine, _) = build_engine();
    let alice = create_user(&engine, "alice").await;
    let bob = create_user(&engine, "bob").await;
    let vars = json!({ "u": alice, "a": bob });

    let response = run(
        &engine,
        "mutation($u: UUID!, $a: UUID!) { unsubscribeFrom(userId: $u, authorId: $a) }",
        vars.clone(),
    )
    .await;
    assert_eq!(response.data(), &json!({ "unsubscribeFrom": null }));
    assert_eq!(response.errors[0].code(), ErrorCode::NotFound);

    let data = run_ok(
        &engine,
        "mutation($u: UUID!, $a: UUID!) { subscribeTo(userId: $u, authorId: $a) { \
         userSubscribedTo { id } } }",
        vars.clone(),
    )
    .await;
    assert_eq!(data["subscribeTo"]["userSubscribedTo"], json!([{ "id": bob }]));

    let data = run_ok(
        &engine,
        "mutation($u: UUID!, $a: UUID!) { unsubscribeFrom(userId: $u, authorId: $a) }",
        vars,
    )
    .await;
    assert_eq!(data, json!({ "unsubscribeFrom": bob }));
}

#[tokio::test]
async fn mutation_fields_run_in_document_order() {
    let (engine, store) = build_engine();
    let alice = create_user(&engine, "alice").await;
    store.reset_calls();

    let data = run_ok(
        &engine,
        "mutation($id: UUID!) {
            renamed: changeUser(id: $id, dto: { name: \"a2\" }) { name }
            second: createUser(dto: { name: \"bob\", balance: 0 }) { name }
            removed: deleteUser(id: $id)
        }",
        json!({ "id": alice }),
    )
    .await;
    assert_eq!(data["renamed"]["name"], "a2");
    assert_eq!(data["removed"], json!(alice));
    assert_eq!(store.calls(), vec!["update_user", "create_user", "delete_user"]);
}

#[tokio::test]
async fn delete_user_cascades_to_owned_rows() {
    let (engine, store) = build_engine();
    let alice = create_user(&engine, "alice").await;
    let bob = create_user(&engine, "bob").await;
    create_post(&engine, &alice, "hello").await;
    assert!(create_profile(&engine, &alice).await.is_ok());
    run_ok(
        &engine,
        "mutation($u: UUID!, $a: UUID!) { subscribeTo(userId: $u, authorId: $a) { id } }",
        json!({ "u": bob, "a": alice }),
    )
    .await;

    let data = run_ok(
        &engine,
        "mutation($id: UUID!) { deleteUser(id: $id) }",
        json!({ "id": alice }),
    )
    .await;
    assert_eq!(data, json!({ "deleteUser": alice }));

    let snapshot = store.snapshot().await;
    assert_eq!(snapshot.users.len(), 1);
    assert!(snapshot.posts.is_empty());
    assert!(snapshot.profiles.is_empty());
    assert!(snapshot.subscriptions.is_empty());
}

#[tokio::test]
async fn post_for_unknown_author_is_rejected() {
    let (engine, _) = build_engine();
    let response = run(
        &engine,
        "mutation($dto: CreatePostInput!) { createPost(dto: $dto) { id } }",
        json!({ "dto": { "title": "t", "content": "c", "authorId": MISSING } }),
    )
    .await;
    assert_eq!(response.data(), &json!({ "createPost": null }));
    assert_eq!(response.errors[0].code(), ErrorCode::ConstraintViolation);
}

// ── Input coercion ──────────────────────────────────────────────────────────

#[tokio::test]
async fn malformed_uuid_variable_is_rejected_before_execution() {
    let (engine, store) = build_engine();
    store.reset_calls();
    let response = run(
        &engine,
        "query($id: UUID!) { user(id: $id) { id } }",
        json!({ "id": "not-a-uuid" }),
    )
    .await;
    assert!(response.data.is_none());
    assert_eq!(response.errors[0].code(), ErrorCode::ScalarCoercion);
    assert!(store.calls().is_empty());
}

#[tokio::test]
async fn malformed_uuid_literal_nulls_the_field() {
    let (engine, _) = build_engine();
    let response = run(
        &engine,
        "{ user(id: \"not-a-uuid\") { id } memberTiers { id } }",
        json!({}),
    )
    .await;
    assert_eq!(response.data()["user"], Value::Null);
    assert_eq!(response.data()["memberTiers"].as_array().unwrap().len(), 2);
    assert_eq!(response.errors.len(), 1);
    assert_eq!(response.errors[0].code(), ErrorCode::ScalarCoercion);
}

#[tokio::test]
async fn unknown_enum_value_in_variables() {
    let (engine, _) = build_engine();
    let response = run(
        &engine,
        "query($id: MemberTierId!) { memberTier(id: $id) { id } }",
        json!({ "id": "gold" }),
    )
    .await;
    assert!(response.data.is_none());
    assert_eq!(response.errors[0].code(), ErrorCode::ScalarCoercion);
}

#[tokio::test]
async fn unknown_input_field_is_rejected() {
    let (engine, store) = build_engine();
    let response = run(
        &engine,
        "mutation($dto: CreateUserInput!) { createUser(dto: $dto) { id } }",
        json!({ "dto": { "name": "x", "balance": 1, "admin": true } }),
    )
    .await;
    assert!(response.data.is_none());
    assert_eq!(response.errors[0].code(), ErrorCode::ArgumentCoercion);
    assert!(store.snapshot().await.users.is_empty());
}

// ── Validation ──────────────────────────────────────────────────────────────

#[tokio::test]
async fn unknown_field_is_a_validation_error() {
    let (engine, _) = build_engine();
    let response = run(&engine, "{ users { email } }", json!({})).await;
    assert!(response.data.is_none());
    assert_eq!(response.errors[0].code(), ErrorCode::GraphqlValidationFailed);
    assert!(!response.errors[0].locations.is_empty());
}

#[tokio::test]
async fn object_field_requires_selection() {
    let (engine, _) = build_engine();
    let response = run(&engine, "{ users }", json!({})).await;
    assert!(response.data.is_none());
    assert_eq!(response.errors[0].code(), ErrorCode::GraphqlValidationFailed);
}

#[tokio::test]
async fn conflicting_response_keys_are_rejected_without_data() {
    let (engine, store) = build_engine();
    create_user(&engine, "alice").await;
    store.reset_calls();
    let response = run(&engine, "{ x: users { id } x: posts { title } }", json!({})).await;
    assert!(response.data.is_none());
    assert_eq!(response.errors[0].code(), ErrorCode::GraphqlValidationFailed);
    assert!(store.calls().is_empty());

    let data = run_ok(&engine, "{ x: users { id } x: users { name } }", json!({})).await;
    assert_eq!(data["x"][0]["name"], "alice");
    assert!(data["x"][0]["id"].is_string());
}

#[tokio::test]
async fn named_operation_is_selected() {
    let (engine, _) = build_engine();
    let response = engine
        .execute(
            GraphQlRequest::new("query A { memberTiers { id } } query B { users { id } }")
                .operation_name("B"),
        )
        .await;
    assert!(response.is_ok());
    assert_eq!(response.data(), &json!({ "users": [] }));
}

// ── Error propagation ───────────────────────────────────────────────────────

#[tokio::test]
async fn failing_nullable_field_keeps_siblings() {
    let engine = Engine::new(Arc::new(FlakyStore(MemoryStore::new())));
    let response = run(
        &engine,
        "query($id: UUID!) { user(id: $id) { id } memberTiers { id } }",
        json!({ "id": MISSING }),
    )
    .await;
    assert_eq!(response.data()["user"], Value::Null);
    assert_eq!(response.data()["memberTiers"].as_array().unwrap().len(), 2);
    assert_eq!(response.errors.len(), 1);
    assert_eq!(response.errors[0].code(), ErrorCode::Internal);
    assert_eq!(
        serde_json::to_value(&response.errors[0].path).unwrap(),
        json!(["user"])
    );
}

#[tokio::test]
async fn failing_non_null_field_nulls_the_nearest_nullable_parent() {
    let store = FlakyStore(MemoryStore::new());
    let alice = store
        .create_user(NewUser {
            name: "alice".into(),
            balance: 1.0,
        })
        .await
        .unwrap();
    let engine = Engine::new(Arc::new(store));

    let response = run(
        &engine,
        "query($id: UUID!) { profile(id: $id) { id } users { name posts { id } } }",
        json!({ "id": alice.id }),
    )
    .await;
    assert_eq!(response.data, Some(Value::Null));
    assert_eq!(response.errors.len(), 1);
    assert_eq!(
        serde_json::to_value(&response.errors[0].path).unwrap(),
        json!(["users", 0, "posts"])
    );
}

#[tokio::test]
async fn sequential_and_concurrent_modes_agree() {
    let store = Arc::new(MemoryStore::new());
    let concurrent = Engine::new(store.clone());
    let alice = create_user(&concurrent, "alice").await;
    create_post(&concurrent, &alice, "hello").await;
    let sequential = Engine::with_options(store, EngineOptions {
        max_depth: 5,
        concurrent_fields: false,
    });

    let query = "{ users { name posts { title } } posts { authorId } memberTiers { id } }";
    assert_eq!(
        run_ok(&concurrent, query, json!({})).await,
        run_ok(&sequential, query, json!({})).await
    );
}
