use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use clap::{Parser, Subcommand};

use riffle_cli::api::client::ApiClient;
use riffle_cli::api::tokens::KeyringTokenStore;
use riffle_cli::commands;

const DEFAULT_API_URL: &str = "http://localhost:8000";

#[derive(Parser)]
#[command(name = "riffle", version, about = "Terminal client for the Riffle video platform")]
struct Cli {
    /// Backend base URL. Falls back to RIFFLE_API_URL, then the
    /// default local server.
    #[arg(long, global = true)]
    api_url: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Log in and store the session tokens in the system keyring
    Login { username: String, password: String },
    /// Create an account, then log in
    Register {
        username: String,
        password: String,
        #[arg(long)]
        email: Option<String>,
        #[arg(long)]
        first_name: Option<String>,
        #[arg(long)]
        last_name: Option<String>,
        /// Avatar image to upload with the registration
        #[arg(long)]
        avatar: Option<PathBuf>,
    },
    /// End the session and clear stored tokens
    Logout,
    /// Show the logged-in user's profile
    Whoami,
    /// Show the post feed
    Feed {
        #[arg(long, default_value_t = 10)]
        limit: u32,
        /// Only posts by this user id
        #[arg(long)]
        user: Option<u64>,
    },
    /// Like or unlike a post
    Like { post_id: u64 },
    /// Save or unsave a post
    Save { post_id: u64 },
    /// Repost or un-repost a post
    Repost { post_id: u64 },
    /// Record a view on a post
    View { post_id: u64 },
    /// List who reposted a post
    Reposts { post_id: u64 },
    /// Upload a new post from a media file
    Upload {
        path: PathBuf,
        #[arg(long)]
        title: Option<String>,
        #[arg(long)]
        description: Option<String>,
        #[arg(long)]
        music_id: Option<u64>,
        /// May be passed multiple times
        #[arg(long = "hashtag-id")]
        hashtag_ids: Vec<u64>,
    },
    /// Edit or delete an existing post
    Post {
        #[command(subcommand)]
        action: PostAction,
    },
    /// Comment operations
    Comment {
        #[command(subcommand)]
        action: CommentAction,
    },
    /// Reply operations
    Reply {
        #[command(subcommand)]
        action: ReplyAction,
    },
    /// Follow or unfollow a user
    Follow { user_id: u64 },
    /// List users
    Users {
        #[arg(long, default_value_t = 20)]
        limit: u32,
        #[arg(long)]
        search: Option<String>,
    },
    /// List your saved posts
    Saved,
    /// Remove a saved-post record by its save id
    Unsave { save_id: u64 },
    /// List hashtags
    Hashtags {
        #[arg(long)]
        search: Option<String>,
    },
    /// Music catalog operations
    Music {
        #[command(subcommand)]
        action: MusicAction,
    },
    /// List post genres
    Genres,
    /// Update your profile fields
    Profile {
        #[arg(long)]
        email: Option<String>,
        #[arg(long)]
        first_name: Option<String>,
        #[arg(long)]
        last_name: Option<String>,
        #[arg(long)]
        bio: Option<String>,
    },
    /// Permanently delete your account
    DeleteAccount {
        /// Required confirmation flag
        #[arg(long)]
        yes: bool,
    },
}

#[derive(Subcommand)]
enum PostAction {
    /// Edit a post's title or description
    Edit {
        post_id: u64,
        #[arg(long)]
        title: Option<String>,
        #[arg(long)]
        description: Option<String>,
    },
    /// Delete a post
    Delete { post_id: u64 },
}

#[derive(Subcommand)]
enum CommentAction {
    /// List comments on a post
    List { post_id: u64 },
    /// Add a comment to a post
    Add { post_id: u64, text: String },
    /// Edit a comment
    Edit { comment_id: u64, text: String },
    /// Delete a comment
    Delete { comment_id: u64 },
    /// Like or unlike a comment
    Like { post_id: u64, comment_id: u64 },
    /// Dislike or un-dislike a comment
    Dislike { post_id: u64, comment_id: u64 },
}

#[derive(Subcommand)]
enum ReplyAction {
    /// Add a reply under a comment
    Add {
        post_id: u64,
        comment_id: u64,
        text: String,
    },
    /// Edit a reply
    Edit { reply_id: u64, text: String },
    /// Delete a reply
    Delete { reply_id: u64 },
    /// Like or unlike a reply
    Like {
        post_id: u64,
        comment_id: u64,
        reply_id: u64,
    },
    /// Dislike or un-dislike a reply
    Dislike {
        post_id: u64,
        comment_id: u64,
        reply_id: u64,
    },
}

#[derive(Subcommand)]
enum MusicAction {
    /// List music tracks
    List,
    /// Upload a music track
    Upload {
        path: PathBuf,
        #[arg(long)]
        title: String,
        #[arg(long)]
        artist: Option<String>,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    dotenvy::dotenv().ok();
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let cli = Cli::parse();
    let base_url = cli
        .api_url
        .clone()
        .or_else(|| std::env::var("RIFFLE_API_URL").ok())
        .unwrap_or_else(|| DEFAULT_API_URL.to_string());
    log::debug!("Using API at {}", base_url);

    let api = ApiClient::new(&base_url, Arc::new(KeyringTokenStore::new()));
    match run(&api, cli.command).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run(api: &ApiClient, command: Command) -> Result<(), Box<dyn std::error::Error>> {
    match command {
        Command::Login { username, password } => commands::login(api, &username, &password).await,
        Command::Register {
            username,
            password,
            email,
            first_name,
            last_name,
            avatar,
        } => {
            commands::register(
                api,
                &username,
                &password,
                email,
                first_name,
                last_name,
                avatar.as_deref(),
            )
            .await
        }
        Command::Logout => commands::logout(api).await,
        Command::Whoami => commands::whoami(api).await,
        Command::Feed { limit, user } => commands::feed(api, limit, user).await,
        Command::Like { post_id } => commands::like(api, post_id).await,
        Command::Save { post_id } => commands::save(api, post_id).await,
        Command::Repost { post_id } => commands::repost(api, post_id).await,
        Command::View { post_id } => commands::view(api, post_id).await,
        Command::Reposts { post_id } => commands::reposts(api, post_id).await,
        Command::Upload {
            path,
            title,
            description,
            music_id,
            hashtag_ids,
        } => commands::upload(api, &path, title, description, music_id, hashtag_ids).await,
        Command::Post { action } => match action {
            PostAction::Edit {
                post_id,
                title,
                description,
            } => commands::post_edit(api, post_id, title, description).await,
            PostAction::Delete { post_id } => commands::post_delete(api, post_id).await,
        },
        Command::Comment { action } => match action {
            CommentAction::List { post_id } => commands::comment_list(api, post_id).await,
            CommentAction::Add { post_id, text } => {
                commands::comment_add(api, post_id, &text).await
            }
            CommentAction::Edit { comment_id, text } => {
                commands::comment_edit(api, comment_id, &text).await
            }
            CommentAction::Delete { comment_id } => {
                commands::comment_delete(api, comment_id).await
            }
            CommentAction::Like {
                post_id,
                comment_id,
            } => commands::comment_react(api, post_id, comment_id, false).await,
            CommentAction::Dislike {
                post_id,
                comment_id,
            } => commands::comment_react(api, post_id, comment_id, true).await,
        },
        Command::Reply { action } => match action {
            ReplyAction::Add {
                post_id,
                comment_id,
                text,
            } => commands::reply_add(api, post_id, comment_id, &text).await,
            ReplyAction::Edit { reply_id, text } => {
                commands::reply_edit(api, reply_id, &text).await
            }
            ReplyAction::Delete { reply_id } => commands::reply_delete(api, reply_id).await,
            ReplyAction::Like {
                post_id,
                comment_id,
                reply_id,
            } => commands::reply_react(api, post_id, comment_id, reply_id, false).await,
            ReplyAction::Dislike {
                post_id,
                comment_id,
                reply_id,
            } => commands::reply_react(api, post_id, comment_id, reply_id, true).await,
        },
        Command::Follow { user_id } => commands::follow(api, user_id).await,
        Command::Users { limit, search } => commands::user_list(api, limit, search).await,
        Command::Saved => commands::saved(api).await,
        Command::Unsave { save_id } => commands::unsave(api, save_id).await,
        Command::Hashtags { search } => commands::hashtags(api, search).await,
        Command::Music { action } => match action {
            MusicAction::List => commands::music_list(api).await,
            MusicAction::Upload {
                path,
                title,
                artist,
            } => commands::music_upload(api, &path, &title, artist.as_deref()).await,
        },
        Command::Genres => commands::genres(api).await,
        Command::Profile {
            email,
            first_name,
            last_name,
            bio,
        } => commands::profile_update(api, email, first_name, last_name, bio).await,
        Command::DeleteAccount { yes } => {
            if !yes {
                println!("Refusing to delete the account without --yes");
                return Ok(());
            }
            commands::delete_account(api).await
        }
    }
}
