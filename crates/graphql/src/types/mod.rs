//! Entity object types, the member tier enum and mutation input types.
//!
//! Scalar columns are property accessors over the parent record. Relations
//! are async resolvers that issue exactly one store call per parent.

use {
    async_graphql_value::{ConstValue, Number},
    futures::{FutureExt, future::BoxFuture},
    quill_store::{MemberTierId, PostFilter, ProfileKey, UserFilter},
};

use crate::{
    context::ResolverContext,
    error::{ExecutionError, Result},
    registry::{
        EnumType, FieldDef, InputObjectType, InputValueDef, MetaType, ObjectType, Registry, TypeRef,
    },
    resolved::{Entity, Resolved},
    scalars::{ScalarKind, enum_value},
};

// ── Type names ──────────────────────────────────────────────────────────────

pub const USER: &str = "User";
pub const POST: &str = "Post";
pub const PROFILE: &str = "Profile";
pub const MEMBER_TIER: &str = "MemberTier";
pub const MEMBER_TIER_ID: &str = "MemberTierId";

pub const CREATE_USER_INPUT: &str = "CreateUserInput";
pub const CREATE_POST_INPUT: &str = "CreatePostInput";
pub const CREATE_PROFILE_INPUT: &str = "CreateProfileInput";
pub const CHANGE_USER_INPUT: &str = "ChangeUserInput";
pub const CHANGE_POST_INPUT: &str = "ChangePostInput";
pub const CHANGE_PROFILE_INPUT: &str = "ChangeProfileInput";

pub const UUID: &str = "UUID";
const STRING: &str = "String";
const FLOAT: &str = "Float";
const INT: &str = "Int";
const BOOLEAN: &str = "Boolean";

/// Register scalars, the enum, the entity objects and the input objects.
pub fn register(registry: &mut Registry) {
    for kind in ScalarKind::ALL {
        registry.register(MetaType::Scalar(kind));
    }
    registry.register(MetaType::Enum(member_tier_id()));
    registry.register(MetaType::Object(user()));
    registry.register(MetaType::Object(post()));
    registry.register(MetaType::Object(profile()));
    registry.register(MetaType::Object(member_tier()));
    for input in inputs() {
        registry.register(MetaType::InputObject(input));
    }
}

// ── Leaf helpers ────────────────────────────────────────────────────────────

fn string(value: &str) -> ConstValue {
    ConstValue::String(value.to_string())
}

fn float(value: f64) -> ConstValue {
    Number::from_f64(value).map_or(ConstValue::Null, ConstValue::Number)
}

fn int(value: i32) -> ConstValue {
    ConstValue::Number(value.into())
}

// ── MemberTierId ────────────────────────────────────────────────────────────

fn member_tier_id() -> EnumType {
    EnumType::new(MEMBER_TIER_ID, MemberTierId::ALL.map(MemberTierId::as_str))
        .description("Identifier of one of the fixed member tiers.")
}

// ── User ────────────────────────────────────────────────────────────────────

fn user() -> ObjectType {
    ObjectType::new(USER)
        .description("A registered user.")
        .field(FieldDef::property("id", TypeRef::named_nn(UUID), |e| {
            Some(string(&e.as_user()?.id))
        }))
        .field(FieldDef::property("name", TypeRef::named_nn(STRING), |e| {
            Some(string(&e.as_user()?.name))
        }))
        .field(FieldDef::property("balance", TypeRef::named_nn(FLOAT), |e| {
            Some(float(e.as_user()?.balance))
        }))
        .field(FieldDef::resolve("profile", TypeRef::named(PROFILE), user_profile))
        .field(FieldDef::resolve("posts", TypeRef::named_nn_list_nn(POST), user_posts))
        .field(
            FieldDef::resolve(
                "userSubscribedTo",
                TypeRef::named_nn_list_nn(USER),
                user_subscribed_to,
            )
            .description("Authors this user subscribes to."),
        )
        .field(
            FieldDef::resolve(
                "subscribedToUser",
                TypeRef::named_nn_list_nn(USER),
                subscribed_to_user,
            )
            .description("Users subscribed to this user."),
        )
}

fn user_profile(ctx: ResolverContext<'_>) -> BoxFuture<'_, Result<Resolved>> {
    async move {
        let user = ctx.parent_user()?;
        let profile = ctx
            .store
            .find_profile(ProfileKey::UserId(user.id.clone()))
            .await?;
        Ok(profile.into())
    }
    .boxed()
}

fn user_posts(ctx: ResolverContext<'_>) -> BoxFuture<'_, Result<Resolved>> {
    async move {
        let user = ctx.parent_user()?;
        let posts = ctx
            .store
            .find_posts(PostFilter::ByAuthor(user.id.clone()))
            .await?;
        Ok(posts.into())
    }
    .boxed()
}

fn user_subscribed_to(ctx: ResolverContext<'_>) -> BoxFuture<'_, Result<Resolved>> {
    async move {
        let user = ctx.parent_user()?;
        let authors = ctx
            .store
            .find_users(UserFilter::FollowedBy(user.id.clone()))
            .await?;
        Ok(authors.into())
    }
    .boxed()
}

fn subscribed_to_user(ctx: ResolverContext<'_>) -> BoxFuture<'_, Result<Resolved>> {
    async move {
        let user = ctx.parent_user()?;
        let followers = ctx
            .store
            .find_users(UserFilter::FollowersOf(user.id.clone()))
            .await?;
        Ok(followers.into())
    }
    .boxed()
}

// ── Post ────────────────────────────────────────────────────────────────────

fn post() -> ObjectType {
    ObjectType::new(POST)
        .description("A post written by one user.")
        .field(FieldDef::property("id", TypeRef::named_nn(UUID), |e| {
            Some(string(&e.as_post()?.id))
        }))
        .field(FieldDef::property("title", TypeRef::named_nn(STRING), |e| {
            Some(string(&e.as_post()?.title))
        }))
        .field(FieldDef::property("content", TypeRef::named_nn(STRING), |e| {
            Some(string(&e.as_post()?.content))
        }))
        .field(FieldDef::property("authorId", TypeRef::named_nn(UUID), |e| {
            Some(string(&e.as_post()?.author_id))
        }))
}

// ── Profile ─────────────────────────────────────────────────────────────────

fn profile() -> ObjectType {
    ObjectType::new(PROFILE)
        .description("Personal details of a user; at most one per user.")
        .field(FieldDef::property("id", TypeRef::named_nn(UUID), |e| {
            Some(string(&e.as_profile()?.id))
        }))
        .field(FieldDef::property("isMale", TypeRef::named_nn(BOOLEAN), |e| {
            Some(ConstValue::Boolean(e.as_profile()?.is_male))
        }))
        .field(FieldDef::property("yearOfBirth", TypeRef::named_nn(INT), |e| {
            Some(int(e.as_profile()?.year_of_birth))
        }))
        .field(FieldDef::property("userId", TypeRef::named_nn(UUID), |e| {
            Some(string(&e.as_profile()?.user_id))
        }))
        .field(FieldDef::property(
            "memberTierId",
            TypeRef::named_nn(MEMBER_TIER_ID),
            |e| Some(enum_value(e.as_profile()?.member_tier_id.as_str())),
        ))
        .field(FieldDef::resolve(
            "memberTier",
            TypeRef::named_nn(MEMBER_TIER),
            profile_member_tier,
        ))
}

fn profile_member_tier(ctx: ResolverContext<'_>) -> BoxFuture<'_, Result<Resolved>> {
    async move {
        let profile = ctx.parent_profile()?;
        let tier = ctx.store.find_member_tier(profile.member_tier_id).await?;
        Ok(tier.into())
    }
    .boxed()
}

// ── MemberTier ──────────────────────────────────────────────────────────────

fn member_tier() -> ObjectType {
    ObjectType::new(MEMBER_TIER)
        .description("Discount and posting quota of a membership level.")
        .field(FieldDef::property(
            "id",
            TypeRef::named_nn(MEMBER_TIER_ID),
            |e| Some(enum_value(e.as_member_tier()?.id.as_str())),
        ))
        .field(FieldDef::property("discount", TypeRef::named_nn(FLOAT), |e| {
            Some(float(e.as_member_tier()?.discount))
        }))
        .field(FieldDef::property(
            "postsLimitPerMonth",
            TypeRef::named_nn(INT),
            |e| Some(int(e.as_member_tier()?.posts_limit_per_month)),
        ))
}

// ── Inputs ──────────────────────────────────────────────────────────────────

fn inputs() -> [InputObjectType; 6] {
    [
        InputObjectType::new(CREATE_USER_INPUT)
            .field(InputValueDef::new("name", TypeRef::named_nn(STRING)))
            .field(InputValueDef::new("balance", TypeRef::named_nn(FLOAT))),
        InputObjectType::new(CREATE_POST_INPUT)
            .field(InputValueDef::new("title", TypeRef::named_nn(STRING)))
            .field(InputValueDef::new("content", TypeRef::named_nn(STRING)))
            .field(
                InputValueDef::new("authorId", TypeRef::named_nn(UUID))
                    .description("Id of an existing user."),
            ),
        InputObjectType::new(CREATE_PROFILE_INPUT)
            .field(InputValueDef::new("userId", TypeRef::named_nn(UUID)))
            .field(InputValueDef::new("isMale", TypeRef::named_nn(BOOLEAN)))
            .field(InputValueDef::new("yearOfBirth", TypeRef::named_nn(INT)))
            .field(InputValueDef::new(
                "memberTierId",
                TypeRef::named_nn(MEMBER_TIER_ID),
            )),
        InputObjectType::new(CHANGE_USER_INPUT)
            .description("Only the name of a user can change.")
            .field(InputValueDef::new("name", TypeRef::named(STRING))),
        InputObjectType::new(CHANGE_POST_INPUT)
            .description("Only the title of a post can change.")
            .field(InputValueDef::new("title", TypeRef::named(STRING))),
        InputObjectType::new(CHANGE_PROFILE_INPUT)
            .description("Only the isMale flag of a profile can change.")
            .field(InputValueDef::new("isMale", TypeRef::named(BOOLEAN))),
    ]
}

/// Read the entity a property accessor expects, or report the mismatch.
pub(crate) fn read_property(
    type_name: &str,
    field: &str,
    read: fn(&Entity) -> Option<ConstValue>,
    parent: &Resolved,
) -> Result<ConstValue> {
    parent.as_entity().and_then(read).ok_or_else(|| {
        ExecutionError::internal(format!("{type_name}.{field} cannot be read from its parent"))
    })
}
