//! Command handlers for the terminal front end.
//!
//! Each handler drives the API layer (and the feed view state for
//! toggle interactions) and prints a plain-text result. Failed toggles
//! report the rollback so the user knows local and server state still
//! agree.

use std::error::Error;
use std::path::Path;

use serde_json::{json, Value};

use crate::api::auth::{self, RegisterProfile};
use crate::api::client::ApiClient;
use crate::api::{catalog, comments, posts, users};
use crate::feed::{FeedPost, FeedState};

type CmdResult = Result<(), Box<dyn Error>>;

/// Log in and persist the session tokens.
pub async fn login(api: &ApiClient, username: &str, password: &str) -> CmdResult {
    auth::login(api, username, password).await?;
    if api.tokens().is_authenticated() {
        println!("Logged in as {}", username);
    } else {
        println!("Login accepted but no session token was returned");
    }
    Ok(())
}

/// Register a new account, then log in with the same credentials.
#[allow(clippy::too_many_arguments)]
pub async fn register(
    api: &ApiClient,
    username: &str,
    password: &str,
    email: Option<String>,
    first_name: Option<String>,
    last_name: Option<String>,
    avatar: Option<&Path>,
) -> CmdResult {
    let avatar = match avatar {
        Some(path) => Some((file_name_of(path), tokio::fs::read(path).await?)),
        None => None,
    };
    let profile = RegisterProfile {
        username: username.to_string(),
        password: password.to_string(),
        email,
        first_name,
        last_name,
        avatar,
    };
    auth::register(api, &profile).await?;
    auth::login(api, username, password).await?;
    println!("Registered and logged in as {}", username);
    Ok(())
}

/// End the session. Always succeeds locally.
pub async fn logout(api: &ApiClient) -> CmdResult {
    auth::logout(api).await;
    println!("Logged out");
    Ok(())
}

/// Show the authenticated user's profile.
pub async fn whoami(api: &ApiClient) -> CmdResult {
    let user = users::current(api).await?;
    println!("#{} {}", user.id, user.username);
    if let Some(email) = user.email {
        println!("  email:     {}", email);
    }
    println!("  followers: {}", user.followers_count);
    println!("  following: {}", user.following_count);
    Ok(())
}

/// Print the feed, recording a view for each rendered post.
pub async fn feed(api: &ApiClient, limit: u32, user: Option<u64>) -> CmdResult {
    let mut params = vec![("limit", limit.to_string())];
    if let Some(user) = user {
        params.push(("user", user.to_string()));
    }

    let me = current_user_id(api).await;
    let rows = posts::list(api, &params).await?;
    let feed = FeedState::from_posts(rows, me);

    if feed.posts().is_empty() {
        println!("No posts yet.");
        return Ok(());
    }
    for post in feed.posts() {
        print_post(post);
        feed.record_view(api, post.id).await;
    }
    Ok(())
}

/// Toggle a like on a post, optimistically with rollback.
pub async fn like(api: &ApiClient, post_id: u64) -> CmdResult {
    let mut feed = single_post_feed(api, post_id).await?;
    match feed.toggle_like(api, post_id).await {
        Ok(()) => {
            if let Some(post) = feed.post(post_id) {
                println!(
                    "{} post {} ({} likes)",
                    if post.likes.active { "Liked" } else { "Unliked" },
                    post_id,
                    post.likes.count
                );
            }
            Ok(())
        }
        Err(e) => {
            println!("Like failed, local state rolled back: {}", e);
            Err(e.into())
        }
    }
}

/// Toggle save on a post.
pub async fn save(api: &ApiClient, post_id: u64) -> CmdResult {
    let mut feed = single_post_feed(api, post_id).await?;
    match feed.toggle_save(api, post_id).await {
        Ok(()) => {
            if let Some(post) = feed.post(post_id) {
                println!(
                    "{} post {} ({} saves)",
                    if post.saves.active { "Saved" } else { "Unsaved" },
                    post_id,
                    post.saves.count
                );
            }
            Ok(())
        }
        Err(e) => {
            println!("Save failed, local state rolled back: {}", e);
            Err(e.into())
        }
    }
}

/// Toggle repost on a post.
pub async fn repost(api: &ApiClient, post_id: u64) -> CmdResult {
    let mut feed = single_post_feed(api, post_id).await?;
    match feed.toggle_repost(api, post_id).await {
        Ok(()) => {
            if let Some(post) = feed.post(post_id) {
                println!(
                    "{} post {} ({} reposts)",
                    if post.reposts.active { "Reposted" } else { "Un-reposted" },
                    post_id,
                    post.reposts.count
                );
            }
            Ok(())
        }
        Err(e) => {
            println!("Repost failed, local state rolled back: {}", e);
            Err(e.into())
        }
    }
}

/// Record a view on a post (best-effort analytics).
pub async fn view(api: &ApiClient, post_id: u64) -> CmdResult {
    posts::record_view(api, post_id).await;
    println!("View recorded for post {}", post_id);
    Ok(())
}

/// List who reposted a post.
pub async fn reposts(api: &ApiClient, post_id: u64) -> CmdResult {
    let rows = posts::reposts_of(api, post_id).await;
    if rows.is_empty() {
        println!("No reposts for post {}", post_id);
        return Ok(());
    }
    for row in rows {
        let who = row
            .get("user")
            .and_then(|u| u.get("username"))
            .and_then(Value::as_str)
            .unwrap_or("unknown");
        println!("  reposted by {}", who);
    }
    Ok(())
}

/// List comments on a post.
pub async fn comment_list(api: &ApiClient, post_id: u64) -> CmdResult {
    let rows = comments::list(api, &[("post", post_id.to_string())]).await?;
    if rows.is_empty() {
        println!("No comments on post {}", post_id);
        return Ok(());
    }
    for comment in rows {
        println!(
            "#{} {}: {} (+{}/-{}, {} replies)",
            comment.id,
            comment.user.username,
            comment.text,
            comment.likes_count,
            comment.dislikes_count,
            comment.replies_count
        );
    }
    Ok(())
}

/// Add a comment to a post.
pub async fn comment_add(api: &ApiClient, post_id: u64, text: &str) -> CmdResult {
    let me = current_user_id(api).await;
    let mut feed = single_post_feed(api, post_id).await?;
    let id = feed.add_comment(api, post_id, text, me).await?;
    println!("Comment #{} added to post {}", id, post_id);
    Ok(())
}

/// Edit a comment.
pub async fn comment_edit(api: &ApiClient, comment_id: u64, text: &str) -> CmdResult {
    comments::update(api, comment_id, text).await?;
    println!("Comment #{} updated", comment_id);
    Ok(())
}

/// Delete a comment.
pub async fn comment_delete(api: &ApiClient, comment_id: u64) -> CmdResult {
    comments::delete(api, comment_id).await?;
    println!("Comment #{} deleted", comment_id);
    Ok(())
}

/// Toggle like/dislike on a comment, optimistically with rollback.
pub async fn comment_react(
    api: &ApiClient,
    post_id: u64,
    comment_id: u64,
    dislike: bool,
) -> CmdResult {
    let mut feed = single_post_feed(api, post_id).await?;
    let result = if dislike {
        feed.toggle_comment_dislike(api, post_id, comment_id).await
    } else {
        feed.toggle_comment_like(api, post_id, comment_id).await
    };
    match result {
        Ok(()) => {
            println!("Comment #{} reaction updated", comment_id);
            Ok(())
        }
        Err(e) => {
            println!("Reaction failed, local state rolled back: {}", e);
            Err(e.into())
        }
    }
}

/// Add a reply under a comment.
pub async fn reply_add(api: &ApiClient, post_id: u64, comment_id: u64, text: &str) -> CmdResult {
    let me = current_user_id(api).await;
    let mut feed = single_post_feed(api, post_id).await?;
    let id = feed.add_reply(api, post_id, comment_id, text, me).await?;
    println!("Reply #{} added under comment {}", id, comment_id);
    Ok(())
}

/// Edit a reply.
pub async fn reply_edit(api: &ApiClient, reply_id: u64, text: &str) -> CmdResult {
    comments::reply_update(api, reply_id, text).await?;
    println!("Reply #{} updated", reply_id);
    Ok(())
}

/// Delete a reply.
pub async fn reply_delete(api: &ApiClient, reply_id: u64) -> CmdResult {
    comments::reply_delete(api, reply_id).await?;
    println!("Reply #{} deleted", reply_id);
    Ok(())
}

/// Toggle like/dislike on a reply, optimistically with rollback.
pub async fn reply_react(
    api: &ApiClient,
    post_id: u64,
    comment_id: u64,
    reply_id: u64,
    dislike: bool,
) -> CmdResult {
    let mut feed = single_post_feed(api, post_id).await?;
    let result = if dislike {
        feed.toggle_reply_dislike(api, post_id, comment_id, reply_id)
            .await
    } else {
        feed.toggle_reply_like(api, post_id, comment_id, reply_id)
            .await
    };
    match result {
        Ok(()) => {
            println!("Reply #{} reaction updated", reply_id);
            Ok(())
        }
        Err(e) => {
            println!("Reaction failed, local state rolled back: {}", e);
            Err(e.into())
        }
    }
}

/// Follow or unfollow a user.
pub async fn follow(api: &ApiClient, user_id: u64) -> CmdResult {
    users::follow_toggle(api, user_id).await?;
    println!("Follow toggled for user {}", user_id);
    Ok(())
}

/// List users.
pub async fn user_list(api: &ApiClient, limit: u32, search: Option<String>) -> CmdResult {
    let mut params = vec![("limit", limit.to_string())];
    if let Some(search) = search {
        params.push(("search", search));
    }
    for user in users::list(api, &params).await? {
        println!(
            "#{} {} ({} followers)",
            user.id, user.username, user.followers_count
        );
    }
    Ok(())
}

/// Upload a new post.
pub async fn upload(
    api: &ApiClient,
    path: &Path,
    title: Option<String>,
    description: Option<String>,
    music_id: Option<u64>,
    hashtag_ids: Vec<u64>,
) -> CmdResult {
    let bytes = tokio::fs::read(path).await?;
    let upload = posts::PostUpload {
        file_name: file_name_of(path),
        mime: guess_mime(path).to_string(),
        bytes,
        title,
        description,
        music_id,
        hashtag_ids,
    };
    let created = posts::create(api, upload).await?;
    match created.get("id").and_then(Value::as_u64) {
        Some(id) => println!("Post #{} uploaded", id),
        None => println!("Post uploaded"),
    }
    Ok(())
}

/// Edit a post's metadata.
pub async fn post_edit(
    api: &ApiClient,
    post_id: u64,
    title: Option<String>,
    description: Option<String>,
) -> CmdResult {
    let mut fields = json!({});
    if let Some(title) = title {
        fields["title"] = json!(title);
    }
    if let Some(description) = description {
        fields["description"] = json!(description);
    }
    posts::update(api, post_id, fields).await?;
    println!("Post #{} updated", post_id);
    Ok(())
}

/// Delete a post.
pub async fn post_delete(api: &ApiClient, post_id: u64) -> CmdResult {
    posts::delete(api, post_id).await?;
    println!("Post #{} deleted", post_id);
    Ok(())
}

/// List the current user's saved posts.
pub async fn saved(api: &ApiClient) -> CmdResult {
    let rows = posts::saves(api, &[]).await?;
    if rows.is_empty() {
        println!("No saved posts.");
        return Ok(());
    }
    for save in rows {
        let title = save
            .post
            .get("title")
            .and_then(Value::as_str)
            .unwrap_or("(untitled)");
        println!("save #{}: {}", save.id, title);
    }
    Ok(())
}

/// Remove a saved-post record.
pub async fn unsave(api: &ApiClient, save_id: u64) -> CmdResult {
    posts::save_delete(api, save_id).await?;
    println!("Save #{} removed", save_id);
    Ok(())
}

/// List hashtags.
pub async fn hashtags(api: &ApiClient, search: Option<String>) -> CmdResult {
    let params = match search {
        Some(s) => vec![("search", s)],
        None => Vec::new(),
    };
    for tag in catalog::hashtags(api, &params).await? {
        println!("#{} {}", tag.id, tag.name);
    }
    Ok(())
}

/// List music tracks.
pub async fn music_list(api: &ApiClient) -> CmdResult {
    for track in catalog::music(api, &[]).await? {
        let artist = track.artist.as_deref().unwrap_or("unknown artist");
        println!("#{} {} - {}", track.id, artist, track.title);
    }
    Ok(())
}

/// Upload a music track.
pub async fn music_upload(
    api: &ApiClient,
    path: &Path,
    title: &str,
    artist: Option<&str>,
) -> CmdResult {
    let bytes = tokio::fs::read(path).await?;
    catalog::music_upload(api, &file_name_of(path), guess_mime(path), bytes, title, artist).await?;
    println!("Track \"{}\" uploaded", title);
    Ok(())
}

/// List post genres.
pub async fn genres(api: &ApiClient) -> CmdResult {
    for genre in catalog::genres(api).await? {
        println!("#{} {}", genre.id, genre.name);
    }
    Ok(())
}

/// Update the authenticated user's profile.
pub async fn profile_update(
    api: &ApiClient,
    email: Option<String>,
    first_name: Option<String>,
    last_name: Option<String>,
    bio: Option<String>,
) -> CmdResult {
    let mut fields = json!({});
    if let Some(email) = email {
        fields["email"] = json!(email);
    }
    if let Some(first_name) = first_name {
        fields["first_name"] = json!(first_name);
    }
    if let Some(last_name) = last_name {
        fields["last_name"] = json!(last_name);
    }
    if let Some(bio) = bio {
        fields["bio"] = json!(bio);
    }
    let user = users::update_profile(api, fields).await?;
    println!("Profile updated for {}", user.username);
    Ok(())
}

/// Permanently delete the account and clear the local session.
pub async fn delete_account(api: &ApiClient) -> CmdResult {
    users::delete_account(api).await?;
    api.tokens().clear();
    println!("Account deleted");
    Ok(())
}

// ---- helpers ----

/// Load one post with its comment thread attached, ready for feed
/// mutations.
async fn single_post_feed(api: &ApiClient, post_id: u64) -> Result<FeedState, Box<dyn Error>> {
    let mut post = posts::retrieve(api, post_id).await?;
    if post.comments.is_empty() {
        post.comments = comments::list(api, &[("post", post_id.to_string())]).await?;
    }
    let me = current_user_id(api).await;
    Ok(FeedState::from_posts(vec![post], me))
}

/// The current user's id, or None when not logged in (or the lookup
/// fails -- reaction membership then just renders as inactive).
async fn current_user_id(api: &ApiClient) -> Option<u64> {
    if !api.tokens().is_authenticated() {
        return None;
    }
    match users::current(api).await {
        Ok(user) => Some(user.id),
        Err(e) => {
            log::debug!("Current-user lookup failed: {}", e);
            None
        }
    }
}

fn print_post(post: &FeedPost) {
    println!("#{} {} by {}", post.id, post.title, post.author);
    if !post.description.is_empty() {
        println!("    {}", post.description);
    }
    println!(
        "    {} [{}]  likes:{} comments:{} reposts:{} saves:{}",
        post.media_url,
        post.media_kind,
        post.likes.count,
        post.comments_count,
        post.reposts.count,
        post.saves.count
    );
    if !post.hashtags.is_empty() {
        println!("    tags: {}", post.hashtags.join(", "));
    }
    if let Some(ref music) = post.music {
        println!("    music: {}", music);
    }
}

fn file_name_of(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "upload".to_string())
}

/// Content type from the file extension; the backend only needs a
/// rough hint.
fn guess_mime(path: &Path) -> &'static str {
    match path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
        .as_deref()
    {
        Some("mp4") => "video/mp4",
        Some("mov") => "video/quicktime",
        Some("webm") => "video/webm",
        Some("png") => "image/png",
        Some("jpg") | Some("jpeg") => "image/jpeg",
        Some("webp") => "image/webp",
        Some("gif") => "image/gif",
        Some("mp3") => "audio/mpeg",
        Some("wav") => "audio/wav",
        Some("m4a") => "audio/mp4",
        _ => "application/octet-stream",
    }
}

#[cfg(test)]
mod tests {
    use super::guess_mime;
    use std::path::Path;

    #[test]
    fn test_guess_mime_known_extensions() {
        assert_eq!(guess_mime(Path::new("clip.MP4")), "video/mp4");
        assert_eq!(guess_mime(Path::new("cover.jpeg")), "image/jpeg");
        assert_eq!(guess_mime(Path::new("track.mp3")), "audio/mpeg");
    }

    #[test]
    fn test_guess_mime_unknown_falls_back() {
        assert_eq!(guess_mime(Path::new("data.bin")), "application/octet-stream");
        assert_eq!(guess_mime(Path::new("noext")), "application/octet-stream");
    }
}
