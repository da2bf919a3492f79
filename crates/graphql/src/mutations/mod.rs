//! Mutation root: create, change and delete per entity, plus subscription
//! edges.
//!
//! Every result is nullable, so a failing mutation nulls only its own key.
//! The executor runs these fields one after another in document order.

use {
    futures::{FutureExt, future::BoxFuture},
    quill_store::{
        NewPost, NewProfile, NewUser, PostPatch, ProfilePatch, SubscriptionEdge, UserPatch,
    },
    tracing::debug,
};

use crate::{
    context::ResolverContext,
    error::Result,
    registry::{FieldDef, InputValueDef, ObjectType, TypeRef},
    resolved::Resolved,
    types::{
        CHANGE_POST_INPUT, CHANGE_PROFILE_INPUT, CHANGE_USER_INPUT, CREATE_POST_INPUT,
        CREATE_PROFILE_INPUT, CREATE_USER_INPUT, POST, PROFILE, USER, UUID,
    },
};

pub const MUTATION: &str = "Mutation";

const STRING: &str = "String";

// ── Root ────────────────────────────────────────────────────────────────────

#[must_use]
pub fn mutation_root() -> ObjectType {
    let id = || InputValueDef::new("id", TypeRef::named_nn(UUID));
    let dto = |input| InputValueDef::new("dto", TypeRef::named_nn(input));
    let edge = |field: FieldDef| {
        field
            .argument(InputValueDef::new("userId", TypeRef::named_nn(UUID)))
            .argument(InputValueDef::new("authorId", TypeRef::named_nn(UUID)))
    };

    ObjectType::new(MUTATION)
        .field(
            FieldDef::resolve("createUser", TypeRef::named(USER), create_user)
                .argument(dto(CREATE_USER_INPUT)),
        )
        .field(
            FieldDef::resolve("createPost", TypeRef::named(POST), create_post)
                .argument(dto(CREATE_POST_INPUT)),
        )
        .field(
            FieldDef::resolve("createProfile", TypeRef::named(PROFILE), create_profile)
                .argument(dto(CREATE_PROFILE_INPUT)),
        )
        .field(
            FieldDef::resolve("deleteUser", TypeRef::named(STRING), delete_user).argument(id()),
        )
        .field(
            FieldDef::resolve("deletePost", TypeRef::named(STRING), delete_post).argument(id()),
        )
        .field(
            FieldDef::resolve("deleteProfile", TypeRef::named(STRING), delete_profile)
                .argument(id()),
        )
        .field(
            FieldDef::resolve("changeUser", TypeRef::named(USER), change_user)
                .argument(id())
                .argument(dto(CHANGE_USER_INPUT)),
        )
        .field(
            FieldDef::resolve("changePost", TypeRef::named(POST), change_post)
                .argument(id())
                .argument(dto(CHANGE_POST_INPUT)),
        )
        .field(
            FieldDef::resolve("changeProfile", TypeRef::named(PROFILE), change_profile)
                .argument(id())
                .argument(dto(CHANGE_PROFILE_INPUT)),
        )
        .field(edge(
            FieldDef::resolve("subscribeTo", TypeRef::named(USER), subscribe_to)
                .description("Subscribe `userId` to `authorId`; returns the subscriber."),
        ))
        .field(edge(
            FieldDef::resolve("unsubscribeFrom", TypeRef::named(STRING), unsubscribe_from)
                .description("Remove the subscription; returns the author id."),
        ))
}

// ── Create ──────────────────────────────────────────────────────────────────

fn create_user(ctx: ResolverContext<'_>) -> BoxFuture<'_, Result<Resolved>> {
    async move {
        let dto: NewUser = ctx.arg("dto")?;
        let user = ctx.store.create_user(dto).await?;
        debug!(id = %user.id, "created user");
        Ok(Resolved::object(user))
    }
    .boxed()
}

fn create_post(ctx: ResolverContext<'_>) -> BoxFuture<'_, Result<Resolved>> {
    async move {
        let dto: NewPost = ctx.arg("dto")?;
        let post = ctx.store.create_post(dto).await?;
        debug!(id = %post.id, author = %post.author_id, "created post");
        Ok(Resolved::object(post))
    }
    .boxed()
}

fn create_profile(ctx: ResolverContext<'_>) -> BoxFuture<'_, Result<Resolved>> {
    async move {
        let dto: NewProfile = ctx.arg("dto")?;
        let profile = ctx.store.create_profile(dto).await?;
        debug!(id = %profile.id, user = %profile.user_id, "created profile");
        Ok(Resolved::object(profile))
    }
    .boxed()
}

// ── Delete ──────────────────────────────────────────────────────────────────

fn delete_user(ctx: ResolverContext<'_>) -> BoxFuture<'_, Result<Resolved>> {
    async move {
        let id: String = ctx.arg("id")?;
        let user = ctx.store.delete_user(&id).await?;
        Ok(Resolved::string(user.id))
    }
    .boxed()
}

fn delete_post(ctx: ResolverContext<'_>) -> BoxFuture<'_, Result<Resolved>> {
    async move {
        let id: String = ctx.arg("id")?;
        let post = ctx.store.delete_post(&id).await?;
        Ok(Resolved::string(post.id))
    }
    .boxed()
}

fn delete_profile(ctx: ResolverContext<'_>) -> BoxFuture<'_, Result<Resolved>> {
    async move {
        let id: String = ctx.arg("id")?;
        let profile = ctx.store.delete_profile(&id).await?;
        Ok(Resolved::string(profile.id))
    }
    .boxed()
}

// ── Change ──────────────────────────────────────────────────────────────────

fn change_user(ctx: ResolverContext<'_>) -> BoxFuture<'_, Result<Resolved>> {
    async move {
        let id: String = ctx.arg("id")?;
        let patch: UserPatch = ctx.arg("dto")?;
        Ok(Resolved::object(ctx.store.update_user(&id, patch).await?))
    }
    .boxed()
}

fn change_post(ctx: ResolverContext<'_>) -> BoxFuture<'_, Result<Resolved>> {
    async move {
        let id: String = ctx.arg("id")?;
        let patch: PostPatch = ctx.arg("dto")?;
        Ok(Resolved::object(ctx.store.update_post(&id, patch).await?))
    }
    .boxed()
}

fn change_profile(ctx: ResolverContext<'_>) -> BoxFuture<'_, Result<Resolved>> {
    async move {
        let id: String = ctx.arg("id")?;
        let patch: ProfilePatch = ctx.arg("dto")?;
        Ok(Resolved::object(ctx.store.update_profile(&id, patch).await?))
    }
    .boxed()
}

// ── Subscriptions ───────────────────────────────────────────────────────────

fn edge_args(ctx: &ResolverContext<'_>) -> Result<SubscriptionEdge> {
    let subscriber: String = ctx.arg("userId")?;
    let author: String = ctx.arg("authorId")?;
    Ok(SubscriptionEdge::new(subscriber, author))
}

fn subscribe_to(ctx: ResolverContext<'_>) -> BoxFuture<'_, Result<Resolved>> {
    async move {
        let edge = ctx.store.create_subscription(edge_args(&ctx)?).await?;
        Ok(ctx.store.find_user(&edge.subscriber_id).await?.into())
    }
    .boxed()
}

fn unsubscribe_from(ctx: ResolverContext<'_>) -> BoxFuture<'_, Result<Resolved>> {
    async move {
        let edge = ctx.store.delete_subscription(edge_args(&ctx)?).await?;
        Ok(Resolved::string(edge.author_id))
    }
    .boxed()
}
