use anyhow::{anyhow, Result};
use clap::{Args, Subcommand};
use kathamo::{bootstrap, Database, NewUser, OutputFormat, UserRecord, UserRepository, UserSchema};
use serde::Serialize;
use tabled::Tabled;

/// Arguments for the Users command
#[derive(Args)]
pub struct UsersArgs {
    #[clap(subcommand)]
    pub command: UsersCommands,
}

#[derive(Subcommand)]
pub enum UsersCommands {
    /// List all users
    List,

    /// Show one user by id
    Get {
        /// User id
        id: String,
    },

    /// Create a user with a locked password
    Add {
        #[clap(long)]
        username: String,

        #[clap(long)]
        email: String,

        #[clap(long)]
        display_name: Option<String>,
    },
}

#[derive(Debug, Serialize, Tabled)]
struct UserRow {
    id: String,
    username: String,
    email: String,
    display_name: String,
    status: String,
    created_at: String,
    custom: String,
}

impl From<&UserRecord> for UserRow {
    fn from(user: &UserRecord) -> Self {
        let custom = user
            .custom
            .iter()
            .map(|(column, value)| match value.as_str() {
                Some(v) => format!("{}={}", column, v),
                None => format!("{}=", column),
            })
            .collect::<Vec<_>>()
            .join(", ");

        UserRow {
            id: user.id.clone(),
            username: user.username.clone(),
            email: user.email.clone(),
            display_name: user.display_name.clone().unwrap_or_default(),
            status: user.status.clone(),
            created_at: user.created_at.clone(),
            custom,
        }
    }
}

pub async fn run(
    db: &Database,
    schema: &UserSchema,
    args: UsersArgs,
    format: OutputFormat,
) -> Result<()> {
    bootstrap(db, &[schema]).await?;
    let repo = UserRepository::new(db);

    match args.command {
        UsersCommands::List => {
            let users = repo.list().await?;
            print_users(&users, format);
        }
        UsersCommands::Get { id } => {
            let user = repo
                .find_by_id(&id)
                .await?
                .ok_or_else(|| anyhow!("no user with id '{}'", id))?;
            print_users(&[user], format);
        }
        UsersCommands::Add {
            username,
            email,
            display_name,
        } => {
            let mut new_user = NewUser::new(&username, &email);
            new_user.display_name = display_name;
            let id = repo.insert(&new_user).await?;
            if let Some(user) = repo.find_by_id(&id).await? {
                print_users(&[user], format);
            }
        }
    }
    Ok(())
}

fn print_users(users: &[UserRecord], format: OutputFormat) {
    match format.to_json(users) {
        Some(json) => println!("{}", json),
        None => {
            let rows: Vec<UserRow> = users.iter().map(UserRow::from).collect();
            println!("{}", format.render(&rows));
        }
    }
}
