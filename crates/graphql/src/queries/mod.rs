//! Query root: collection lookups and single-record lookups by id.
//!
//! A single-record lookup that finds nothing resolves to `null` without an
//! error.

use {
    futures::{FutureExt, future::BoxFuture},
    quill_store::{MemberTierId, PostFilter, ProfileKey, UserFilter},
};

use crate::{
    context::ResolverContext,
    error::Result,
    registry::{FieldDef, InputValueDef, ObjectType, TypeRef},
    resolved::Resolved,
    types::{MEMBER_TIER, MEMBER_TIER_ID, POST, PROFILE, USER, UUID},
};

pub const QUERY: &str = "Query";

// ── Root ────────────────────────────────────────────────────────────────────

#[must_use]
pub fn query_root() -> ObjectType {
    let id = || InputValueDef::new("id", TypeRef::named_nn(UUID));

    ObjectType::new(QUERY)
        .field(FieldDef::resolve("users", TypeRef::named_nn_list_nn(USER), users))
        .field(FieldDef::resolve("posts", TypeRef::named_nn_list_nn(POST), posts))
        .field(FieldDef::resolve(
            "profiles",
            TypeRef::named_nn_list_nn(PROFILE),
            profiles,
        ))
        .field(FieldDef::resolve(
            "memberTiers",
            TypeRef::named_nn_list_nn(MEMBER_TIER),
            member_tiers,
        ))
        .field(FieldDef::resolve("user", TypeRef::named(USER), user).argument(id()))
        .field(FieldDef::resolve("post", TypeRef::named(POST), post).argument(id()))
        .field(FieldDef::resolve("profile", TypeRef::named(PROFILE), profile).argument(id()))
        .field(
            FieldDef::resolve("memberTier", TypeRef::named(MEMBER_TIER), member_tier)
                .argument(InputValueDef::new("id", TypeRef::named_nn(MEMBER_TIER_ID))),
        )
}

// ── Collections ─────────────────────────────────────────────────────────────

fn users(ctx: ResolverContext<'_>) -> BoxFuture<'_, Result<Resolved>> {
    async move { Ok(ctx.store.find_users(UserFilter::All).await?.into()) }.boxed()
}

fn posts(ctx: ResolverContext<'_>) -> BoxFuture<'_, Result<Resolved>> {
    async move { Ok(ctx.store.find_posts(PostFilter::All).await?.into()) }.boxed()
}

fn profiles(ctx: ResolverContext<'_>) -> BoxFuture<'_, Result<Resolved>> {
    async move { Ok(ctx.store.find_profiles().await?.into()) }.boxed()
}

fn member_tiers(ctx: ResolverContext<'_>) -> BoxFuture<'_, Result<Resolved>> {
    async move { Ok(ctx.store.find_member_tiers().await?.into()) }.boxed()
}

// ── By id ───────────────────────────────────────────────────────────────────

fn user(ctx: ResolverContext<'_>) -> BoxFuture<'_, Result<Resolved>> {
    async move {
        let id: String = ctx.arg("id")?;
        Ok(ctx.store.find_user(&id).await?.into())
    }
    .boxed()
}

fn post(ctx: ResolverContext<'_>) -> BoxFuture<'_, Result<Resolved>> {
    async move {
        let id: String = ctx.arg("id")?;
        Ok(ctx.store.find_post(&id).await?.into())
    }
    .boxed()
}

fn profile(ctx: ResolverContext<'_>) -> BoxFuture<'_, Result<Resolved>> {
    async move {
        let id: String = ctx.arg("id")?;
        Ok(ctx.store.find_profile(ProfileKey::Id(id)).await?.into())
    }
    .boxed()
}

fn member_tier(ctx: ResolverContext<'_>) -> BoxFuture<'_, Result<Resolved>> {
    async move {
        let id: MemberTierId = ctx.arg("id")?;
        Ok(ctx.store.find_member_tier(id).await?.into())
    }
    .boxed()
}
