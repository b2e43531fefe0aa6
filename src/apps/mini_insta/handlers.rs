use askama::Template;
use axum::{
    extract::{Path, Query, State},
    response::{IntoResponse, Redirect, Response},
    Form,
};
use rusqlite::Connection;
use tracing::info;

use super::forms::{CommentForm, CreatePostForm, SearchQuery, UpdatePostForm, UpdateProfileForm};
use super::models::{self as store, profile_url, Comment, Photo, Post, Profile};
use crate::error::{AppError, FieldErrors, Result};
use crate::state::AppState;
use crate::templates::render;

/// A post with everything needed to draw it in a list.
pub struct PostCard {
    pub post: Post,
    pub author: Profile,
    pub photos: Vec<Photo>,
    pub liked: bool,
}

fn cards(conn: &Connection, posts: Vec<Post>, viewer: Option<i64>) -> Result<Vec<PostCard>> {
    posts
        .into_iter()
        .map(|post| {
            let author = store::require_profile(conn, post.profile_id)?;
            let photos = store::photos_for_post(conn, post.id)?;
            let liked = match viewer {
                Some(id) => store::has_liked(conn, id, post.id)?,
                None => false,
            };
            Ok(PostCard {
                post,
                author,
                photos,
                liked,
            })
        })
        .collect()
}

fn error_messages(errors: &FieldErrors) -> Vec<String> {
    errors
        .iter()
        .flat_map(|(field, messages)| messages.iter().map(move |m| format!("{field}: {m}")))
        .collect()
}

#[derive(Template)]
#[template(path = "mini_insta/show_all_profiles.html")]
struct ProfileListTemplate {
    profiles: Vec<Profile>,
}

#[derive(Template)]
#[template(path = "mini_insta/show_profile.html")]
struct ProfileTemplate {
    profile: Profile,
    posts: Vec<PostCard>,
    num_followers: i64,
    num_following: i64,
}

#[derive(Template)]
#[template(path = "mini_insta/show_post.html")]
struct PostTemplate {
    card: PostCard,
    comments: Vec<Comment>,
    likes: Vec<Profile>,
}

#[derive(Template)]
#[template(path = "mini_insta/create_post_form.html")]
struct CreatePostTemplate {
    profile: Profile,
    form: CreatePostForm,
    errors: Vec<String>,
}

#[derive(Template)]
#[template(path = "mini_insta/update_profile_form.html")]
struct UpdateProfileTemplate {
    profile: Profile,
    form: UpdateProfileForm,
    errors: Vec<String>,
}

#[derive(Template)]
#[template(path = "mini_insta/update_post_form.html")]
struct UpdatePostTemplate {
    post: Post,
}

#[derive(Template)]
#[template(path = "mini_insta/delete_post_form.html")]
struct DeletePostTemplate {
    card: PostCard,
}

#[derive(Template)]
#[template(path = "mini_insta/show_followers.html")]
struct FollowersTemplate {
    profile: Profile,
    followers: Vec<Profile>,
}

#[derive(Template)]
#[template(path = "mini_insta/show_following.html")]
struct FollowingTemplate {
    profile: Profile,
    following: Vec<Profile>,
}

#[derive(Template)]
#[template(path = "mini_insta/show_feed.html")]
struct FeedTemplate {
    profile: Profile,
    posts: Vec<PostCard>,
}

#[derive(Template)]
#[template(path = "mini_insta/search_results.html")]
struct SearchTemplate {
    profile: Profile,
    query: String,
    searched: bool,
    profiles: Vec<SearchHit>,
    posts: Vec<PostCard>,
}

struct SearchHit {
    profile: Profile,
    follows: bool,
}

pub async fn show_all_profiles(State(state): State<AppState>) -> Result<impl IntoResponse> {
    let profiles = store::all_profiles(&*state.db.conn()?)?;
    render(&ProfileListTemplate { profiles })
}

pub async fn show_profile(
    State(state): State<AppState>,
    Path(pk): Path<i64>,
) -> Result<impl IntoResponse> {
    let template = {
        let conn = state.db.conn()?;
        let profile = store::require_profile(&conn, pk)?;
        let posts = cards(&conn, store::posts_by_profile(&conn, pk)?, None)?;
        ProfileTemplate {
            num_followers: store::num_followers(&conn, pk)?,
            num_following: store::num_following(&conn, pk)?,
            profile,
            posts,
        }
    };
    render(&template)
}

fn load_card(conn: &Connection, pk: i64) -> Result<PostCard> {
    let post = store::require_post(conn, pk)?;
    cards(conn, vec![post], None)?
        .pop()
        .ok_or(AppError::NotFound("Post"))
}

pub async fn show_post(
    State(state): State<AppState>,
    Path(pk): Path<i64>,
) -> Result<impl IntoResponse> {
    let template = {
        let conn = state.db.conn()?;
        PostTemplate {
            card: load_card(&conn, pk)?,
            comments: store::comments_for_post(&conn, pk)?,
            likes: store::likes_for_post(&conn, pk)?,
        }
    };
    render(&template)
}

pub async fn create_post_form(
    State(state): State<AppState>,
    Path(pk): Path<i64>,
) -> Result<impl IntoResponse> {
    let profile = store::require_profile(&*state.db.conn()?, pk)?;
    render(&CreatePostTemplate {
        profile,
        form: CreatePostForm::default(),
        errors: Vec::new(),
    })
}

pub async fn create_post(
    State(state): State<AppState>,
    Path(pk): Path<i64>,
    Form(form): Form<CreatePostForm>,
) -> Result<Response> {
    let mut conn = state.db.conn()?;
    let profile = store::require_profile(&conn, pk)?;
    if let Err(errors) = form.validate() {
        drop(conn);
        let page = render(&CreatePostTemplate {
            profile,
            errors: error_messages(&errors),
            form,
        })?;
        return Ok(page.into_response());
    }
    let post = store::create_post(&mut conn, pk, &form.caption, form.image_url.as_deref())?;
    info!("Profile {} created post {}", profile.username, post.id);
    Ok(Redirect::to(&profile.url()).into_response())
}

pub async fn update_profile_form(
    State(state): State<AppState>,
    Path(pk): Path<i64>,
) -> Result<impl IntoResponse> {
    let profile = store::require_profile(&*state.db.conn()?, pk)?;
    let form = UpdateProfileForm {
        bio_text: profile.bio_text.clone(),
        display_name: profile.display_name.clone(),
        profile_image_url: profile.profile_image_url.clone(),
    };
    render(&UpdateProfileTemplate {
        profile,
        form,
        errors: Vec::new(),
    })
}

pub async fn update_profile(
    State(state): State<AppState>,
    Path(pk): Path<i64>,
    Form(form): Form<UpdateProfileForm>,
) -> Result<Response> {
    let conn = state.db.conn()?;
    let profile = store::require_profile(&conn, pk)?;
    match form.clone().validate() {
        Ok(changes) => {
            let profile = store::update_profile(&conn, pk, &changes)?;
            Ok(Redirect::to(&profile.url()).into_response())
        }
        Err(errors) => {
            drop(conn);
            let page = render(&UpdateProfileTemplate {
                profile,
                form,
                errors: error_messages(&errors),
            })?;
            Ok(page.into_response())
        }
    }
}

pub async fn update_post_form(
    State(state): State<AppState>,
    Path(pk): Path<i64>,
) -> Result<impl IntoResponse> {
    let post = store::require_post(&*state.db.conn()?, pk)?;
    render(&UpdatePostTemplate { post })
}

pub async fn update_post(
    State(state): State<AppState>,
    Path(pk): Path<i64>,
    Form(form): Form<UpdatePostForm>,
) -> Result<Redirect> {
    let post = store::update_post_caption(&*state.db.conn()?, pk, &form.caption)?;
    Ok(Redirect::to(&post.url()))
}

pub async fn delete_post_form(
    State(state): State<AppState>,
    Path(pk): Path<i64>,
) -> Result<impl IntoResponse> {
    let card = load_card(&*state.db.conn()?, pk)?;
    render(&DeletePostTemplate { card })
}

pub async fn delete_post(
    State(state): State<AppState>,
    Path(pk): Path<i64>,
) -> Result<Redirect> {
    let conn = state.db.conn()?;
    let post = store::require_post(&conn, pk)?;
    store::delete_post(&conn, pk)?;
    info!("Deleted post {}", pk);
    Ok(Redirect::to(&profile_url(post.profile_id)))
}

pub async fn show_followers(
    State(state): State<AppState>,
    Path(pk): Path<i64>,
) -> Result<impl IntoResponse> {
    let template = {
        let conn = state.db.conn()?;
        FollowersTemplate {
            profile: store::require_profile(&conn, pk)?,
            followers: store::followers(&conn, pk)?,
        }
    };
    render(&template)
}

pub async fn show_following(
    State(state): State<AppState>,
    Path(pk): Path<i64>,
) -> Result<impl IntoResponse> {
    let template = {
        let conn = state.db.conn()?;
        FollowingTemplate {
            profile: store::require_profile(&conn, pk)?,
            following: store::following(&conn, pk)?,
        }
    };
    render(&template)
}

pub async fn show_feed(
    State(state): State<AppState>,
    Path(pk): Path<i64>,
) -> Result<impl IntoResponse> {
    let template = {
        let conn = state.db.conn()?;
        let profile = store::require_profile(&conn, pk)?;
        let posts = cards(&conn, store::post_feed(&conn, pk)?, Some(pk))?;
        FeedTemplate { profile, posts }
    };
    render(&template)
}

pub async fn search(
    State(state): State<AppState>,
    Path(pk): Path<i64>,
    Query(params): Query<SearchQuery>,
) -> Result<impl IntoResponse> {
    let template = {
        let conn = state.db.conn()?;
        let profile = store::require_profile(&conn, pk)?;
        let query = params.query.unwrap_or_default().trim().to_string();
        if query.is_empty() {
            SearchTemplate {
                profile,
                query,
                searched: false,
                profiles: Vec::new(),
                posts: Vec::new(),
            }
        } else {
            let profiles = store::search_profiles(&conn, &query)?
                .into_iter()
                .map(|p| {
                    let follows = store::is_following(&conn, pk, p.id)?;
                    Ok(SearchHit { profile: p, follows })
                })
                .collect::<Result<Vec<_>>>()?;
            let posts = cards(&conn, store::search_posts(&conn, &query)?, Some(pk))?;
            SearchTemplate {
                profile,
                query,
                searched: true,
                profiles,
                posts,
            }
        }
    };
    render(&template)
}

// Actions taken by profile `pk`.

pub async fn follow(
    State(state): State<AppState>,
    Path((pk, other)): Path<(i64, i64)>,
) -> Result<Redirect> {
    let conn = state.db.conn()?;
    store::require_profile(&conn, pk)?;
    let target = store::require_profile(&conn, other)?;
    if store::follow(&conn, pk, other)? {
        info!("Profile {} now follows {}", pk, target.username);
    }
    Ok(Redirect::to(&target.url()))
}

pub async fn delete_follow(
    State(state): State<AppState>,
    Path((pk, other)): Path<(i64, i64)>,
) -> Result<Redirect> {
    let conn = state.db.conn()?;
    store::require_profile(&conn, pk)?;
    let target = store::require_profile(&conn, other)?;
    store::unfollow(&conn, pk, other)?;
    Ok(Redirect::to(&target.url()))
}

pub async fn like(
    State(state): State<AppState>,
    Path((pk, post_id)): Path<(i64, i64)>,
) -> Result<Redirect> {
    let conn = state.db.conn()?;
    store::require_profile(&conn, pk)?;
    let post = store::require_post(&conn, post_id)?;
    store::like(&conn, pk, &post)?;
    Ok(Redirect::to(&post.url()))
}

pub async fn delete_like(
    State(state): State<AppState>,
    Path((pk, post_id)): Path<(i64, i64)>,
) -> Result<Redirect> {
    let conn = state.db.conn()?;
    store::require_profile(&conn, pk)?;
    let post = store::require_post(&conn, post_id)?;
    store::unlike(&conn, pk, post.id)?;
    Ok(Redirect::to(&post.url()))
}

pub async fn comment(
    State(state): State<AppState>,
    Path((pk, post_id)): Path<(i64, i64)>,
    Form(form): Form<CommentForm>,
) -> Result<Redirect> {
    let conn = state.db.conn()?;
    store::require_profile(&conn, pk)?;
    let post = store::require_post(&conn, post_id)?;
    store::add_comment(&conn, post.id, pk, &form.text)?;
    Ok(Redirect::to(&post.url()))
}
