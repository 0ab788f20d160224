//! Subcommand handlers. Each one drives the console and prints the result.

use anyhow::{bail, Context, Result};
use postdesk_core::models::{
    Author, Blog, BlogFilter, BlogStatus, Category, CategoryUpdate, NewAuthor, NewBlog, NewCategory,
    ResourceId,
};
use postdesk_core::utils::truncate_string;
use postdesk_core::AdminConsole;
use serde::Serialize;
use tracing::info;

use crate::args::{AuthorsCmd, BlogsCmd, CategoriesCmd};

/// Column width for titles and names in table output
const TITLE_WIDTH: usize = 40;

/// How results are written to stdout.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Output {
    Table,
    Json,
}

pub async fn login(console: &AdminConsole, email: &str, password: Option<String>) -> Result<()> {
    let password = match password {
        Some(password) => password,
        None => rpassword::prompt_password("Password: ").context("Failed to read password")?,
    };

    if console.login(email, &password).await? {
        println!("Login successful");
        Ok(())
    } else {
        bail!("Invalid email or password")
    }
}

pub fn logout(console: &AdminConsole) {
    console.logout();
    println!("Logged out");
}

pub fn whoami(console: &AdminConsole) {
    match console.current_user() {
        Some(user) => println!("{}", user.email),
        None => println!("Not logged in"),
    }
}

pub async fn blogs(console: &AdminConsole, cmd: BlogsCmd, output: Output) -> Result<()> {
    match cmd {
        BlogsCmd::List {
            search,
            tag,
            status,
            category,
        } => {
            let filter = BlogFilter {
                search,
                tag,
                status: status.map(BlogStatus::from),
                category_id: category,
            };
            let blogs = console.blogs(&filter).await?;
            print_list(blogs.as_slice(), output, blog_row)
        }
        BlogsCmd::Add {
            title,
            body,
            author,
            category,
            tags,
            cover,
            status,
        } => {
            let mut blog = NewBlog {
                title,
                body,
                author_id: author,
                category_id: category,
                status: status.into(),
                cover_image_url: cover,
                ..Default::default()
            };
            for tag in &tags {
                blog.add_tag(tag);
            }
            let created = console.create_blog(blog).await?;
            info!(id = %created.id, "Blog created");
            print_one(&created, output, blog_row)
        }
        BlogsCmd::Publish { id } => set_status(console, &id, BlogStatus::Published, output).await,
        BlogsCmd::Unpublish { id } => set_status(console, &id, BlogStatus::Draft, output).await,
        BlogsCmd::Delete { id } => {
            console.delete_blog(&ResourceId::from(id.as_str())).await?;
            println!("Deleted blog {}", id);
            Ok(())
        }
    }
}

async fn set_status(console: &AdminConsole, id: &str, status: BlogStatus, output: Output) -> Result<()> {
    let blog = console
        .change_blog_status(&ResourceId::from(id), status)
        .await?;
    print_one(&blog, output, blog_row)
}

pub async fn categories(console: &AdminConsole, cmd: CategoriesCmd, output: Output) -> Result<()> {
    match cmd {
        CategoriesCmd::List => {
            let categories = console.categories().await?;
            print_list(categories.as_slice(), output, category_row)
        }
        CategoriesCmd::Add { title } => {
            let category = console.create_category(NewCategory::new(title)).await?;
            print_one(&category, output, category_row)
        }
        CategoriesCmd::Rename { id, title } => {
            let category = console
                .update_category(CategoryUpdate {
                    id: ResourceId::from(id),
                    title,
                })
                .await?;
            print_one(&category, output, category_row)
        }
        CategoriesCmd::Delete { id } => {
            console.delete_category(&ResourceId::from(id.as_str())).await?;
            println!("Deleted category {}", id);
            Ok(())
        }
    }
}

pub async fn authors(console: &AdminConsole, cmd: AuthorsCmd, output: Output) -> Result<()> {
    match cmd {
        AuthorsCmd::List => {
            let authors = console.authors().await?;
            print_list(authors.as_slice(), output, author_row)
        }
        AuthorsCmd::Add { name, bio, avatar } => {
            let author = console.create_author(NewAuthor { name, bio, avatar }).await?;
            print_one(&author, output, author_row)
        }
        AuthorsCmd::Delete { id } => {
            console.delete_author(&ResourceId::from(id.as_str())).await?;
            println!("Deleted author {}", id);
            Ok(())
        }
    }
}

// ============================================================================
// Output
// ============================================================================

fn print_list<T: Serialize>(items: &[T], output: Output, row: fn(&T) -> String) -> Result<()> {
    match output {
        Output::Json => print_json(&items),
        Output::Table => {
            if items.is_empty() {
                println!("(none)");
            }
            for item in items {
                println!("{}", row(item));
            }
            Ok(())
        }
    }
}

fn print_one<T: Serialize>(item: &T, output: Output, row: fn(&T) -> String) -> Result<()> {
    match output {
        Output::Json => print_json(item),
        Output::Table => {
            println!("{}", row(item));
            Ok(())
        }
    }
}

fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    let out = serde_json::to_string_pretty(value).context("Failed to render output")?;
    println!("{out}");
    Ok(())
}

fn blog_row(blog: &Blog) -> String {
    format!(
        "{:<8} {:<10} {:<w$} {:<20} {:<16} {}",
        blog.id,
        blog.status,
        truncate_string(&blog.title, TITLE_WIDTH),
        truncate_string(blog.author_name(), 20),
        truncate_string(blog.category_title(), 16),
        blog.created_display(),
        w = TITLE_WIDTH,
    )
}

fn category_row(category: &Category) -> String {
    format!("{:<8} {}", category.id, category.title)
}

fn author_row(author: &Author) -> String {
    let bio = if author.bio.is_empty() {
        String::new()
    } else {
        truncate_string(&author.bio, TITLE_WIDTH)
    };
    format!("{:<8} {:<w$} {}", author.id, author.name, bio, w = TITLE_WIDTH / 2)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blog_row_falls_back_for_missing_relations() {
        let blog: Blog = serde_json::from_value(serde_json::json!({
            "id": 3, "title": "Hello", "status": "Published"
        }))
        .expect("blog");
        let row = blog_row(&blog);
        assert!(row.starts_with("3"));
        assert!(row.contains("Published"));
        assert!(row.contains("Unknown author"));
        assert!(row.contains("Uncategorized"));
    }

    #[test]
    fn test_long_titles_are_truncated() {
        let blog: Blog = serde_json::from_value(serde_json::json!({
            "id": "a", "title": "x".repeat(100)
        }))
        .expect("blog");
        assert!(blog_row(&blog).contains("..."));
    }
}
