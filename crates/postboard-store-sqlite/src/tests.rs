//! Integration tests for `SqliteStore` against an in-memory database.

use postboard_core::{
  chat::NewMessage,
  page::PageRequest,
  post::{Author, NewPost, PostPatch},
  store::FeedStore,
  user::{DEFAULT_STATUS, NewUser, User},
};
use uuid::Uuid;

use crate::SqliteStore;

async fn store() -> SqliteStore {
  SqliteStore::open_in_memory()
    .await
    .expect("in-memory store")
}

async fn user(s: &SqliteStore, email: &str, name: &str) -> User {
  s.add_user(NewUser {
    email:         email.into(),
    name:          name.into(),
    password_hash: "$argon2id$fake".into(),
  })
  .await
  .unwrap()
}

fn new_post(creator_id: Uuid, title: &str) -> NewPost {
  NewPost {
    title: title.into(),
    content: "Some content".into(),
    image_url: "images/a.png".into(),
    creator_id,
  }
}

// ─── Users ───────────────────────────────────────────────────────────────────

#[tokio::test]
async fn add_and_get_user() {
  let s = store().await;

  let created = user(&s, "a@a.com", "A").await;
  assert_eq!(created.status, DEFAULT_STATUS);

  let fetched = s.get_user(created.user_id).await.unwrap().unwrap();
  assert_eq!(fetched, created);
}

#[tokio::test]
async fn get_user_missing_returns_none() {
  let s = store().await;
  assert!(s.get_user(Uuid::new_v4()).await.unwrap().is_none());
}

#[tokio::test]
async fn duplicate_email_is_rejected() {
  let s = store().await;
  user(&s, "a@a.com", "A").await;
  let err = s
    .add_user(NewUser {
      email:         "a@a.com".into(),
      name:          "Other".into(),
      password_hash: "x".into(),
    })
    .await;
  assert!(err.is_err());
}

#[tokio::test]
async fn credentials_lookup_returns_hash() {
  let s = store().await;
  let created = user(&s, "a@a.com", "A").await;

  let creds = s.find_credentials("a@a.com").await.unwrap().unwrap();
  assert_eq!(creds.user.user_id, created.user_id);
  assert_eq!(creds.password_hash, "$argon2id$fake");

  assert!(s.find_credentials("b@b.com").await.unwrap().is_none());
}

#[tokio::test]
async fn set_status_replaces_value() {
  let s = store().await;
  let created = user(&s, "a@a.com", "A").await;

  let updated = s
    .set_status(created.user_id, "Busy".into())
    .await
    .unwrap()
    .unwrap();
  assert_eq!(updated.status, "Busy");

  assert!(
    s.set_status(Uuid::new_v4(), "Busy".into())
      .await
      .unwrap()
      .is_none()
  );
}

#[tokio::test]
async fn list_users_paginates() {
  let s = store().await;
  for i in 0..5 {
    user(&s, &format!("u{i}@a.com"), &format!("User {i}")).await;
  }

  let first = s.list_users(PageRequest::new(Some(1), 2)).await.unwrap();
  assert_eq!(first.total, 5);
  assert_eq!(first.items.len(), 2);
  assert_eq!(first.items[0].name, "User 0");

  let last = s.list_users(PageRequest::new(Some(3), 2)).await.unwrap();
  assert_eq!(last.total, 5);
  assert_eq!(last.items.len(), 1);
  assert_eq!(last.items[0].name, "User 4");
}

#[tokio::test]
async fn post_links_are_ordered_and_removable() {
  let s = store().await;
  let u = user(&s, "a@a.com", "A").await;
  let p1 = Uuid::new_v4();
  let p2 = Uuid::new_v4();

  s.link_post(u.user_id, p1).await.unwrap();
  s.link_post(u.user_id, p2).await.unwrap();
  s.link_post(u.user_id, p1).await.unwrap();
  assert_eq!(s.user_post_ids(u.user_id).await.unwrap(), vec![p1, p2]);

  s.unlink_post(u.user_id, p1).await.unwrap();
  s.unlink_post(u.user_id, Uuid::new_v4()).await.unwrap();
  assert_eq!(s.user_post_ids(u.user_id).await.unwrap(), vec![p2]);
}

// ─── Posts ───────────────────────────────────────────────────────────────────

#[tokio::test]
async fn add_post_carries_creator_name() {
  let s = store().await;
  let u = user(&s, "a@a.com", "Bruno").await;

  let post = s.add_post(new_post(u.user_id, "First post")).await.unwrap();
  assert_eq!(post.creator.user_id, u.user_id);
  assert_eq!(post.creator.name, "Bruno");
  assert_eq!(post.created_at, post.updated_at);

  let fetched = s.get_post(post.post_id).await.unwrap().unwrap();
  assert_eq!(fetched, post);
}

#[tokio::test]
async fn add_post_for_unknown_creator_fails() {
  let s = store().await;
  assert!(s.add_post(new_post(Uuid::new_v4(), "Orphan")).await.is_err());
}

#[tokio::test]
async fn repeated_reads_are_identical() {
  let s = store().await;
  let u = user(&s, "a@a.com", "A").await;
  let post = s.add_post(new_post(u.user_id, "Stable")).await.unwrap();

  let a = s.get_post(post.post_id).await.unwrap();
  let b = s.get_post(post.post_id).await.unwrap();
  assert_eq!(a, b);
}

#[tokio::test]
async fn list_posts_newest_first_with_page_sizes() {
  let s = store().await;
  let u = user(&s, "a@a.com", "A").await;
  for i in 0..5 {
    s.add_post(new_post(u.user_id, &format!("Post {i}")))
      .await
      .unwrap();
  }

  let per_page = 2u32;
  let n = 5i64;
  for k in 1..=4u32 {
    let page = s
      .list_posts(PageRequest::new(Some(k), per_page))
      .await
      .unwrap();
    let expected = (n - i64::from(k - 1) * i64::from(per_page))
      .clamp(0, i64::from(per_page));
    assert_eq!(page.total, 5, "page {k}");
    assert_eq!(page.items.len() as i64, expected, "page {k}");
  }

  let first = s.list_posts(PageRequest::new(Some(1), 2)).await.unwrap();
  assert_eq!(first.items[0].title, "Post 4");
  assert_eq!(first.items[1].title, "Post 3");
}

#[tokio::test]
async fn update_post_replaces_fields() {
  let s = store().await;
  let u = user(&s, "a@a.com", "A").await;
  let post = s.add_post(new_post(u.user_id, "Before")).await.unwrap();

  let updated = s
    .update_post(post.post_id, PostPatch {
      title:     "After".into(),
      content:   "New content".into(),
      image_url: "images/b.png".into(),
    })
    .await
    .unwrap()
    .unwrap();

  assert_eq!(updated.title, "After");
  assert_eq!(updated.image_url, "images/b.png");
  assert_eq!(updated.created_at, post.created_at);
  assert!(updated.updated_at >= post.updated_at);
}

#[tokio::test]
async fn update_missing_post_returns_none() {
  let s = store().await;
  let patch = PostPatch {
    title:     "After".into(),
    content:   "New content".into(),
    image_url: "images/b.png".into(),
  };
  assert!(s.update_post(Uuid::new_v4(), patch).await.unwrap().is_none());
}

#[tokio::test]
async fn remove_post_reports_existence() {
  let s = store().await;
  let u = user(&s, "a@a.com", "A").await;
  let post = s.add_post(new_post(u.user_id, "Doomed")).await.unwrap();

  assert!(s.remove_post(post.post_id).await.unwrap());
  assert!(s.get_post(post.post_id).await.unwrap().is_none());
  assert!(!s.remove_post(post.post_id).await.unwrap());
}

#[tokio::test]
async fn posts_with_image_matches_exact_url() {
  let s = store().await;
  let u = user(&s, "a@a.com", "A").await;
  let first = s.add_post(new_post(u.user_id, "First")).await.unwrap();
  let second = s.add_post(new_post(u.user_id, "Second")).await.unwrap();

  let mut ids = s.posts_with_image("images/a.png").await.unwrap();
  ids.sort();
  let mut expected = vec![first.post_id, second.post_id];
  expected.sort();
  assert_eq!(ids, expected);

  assert!(s.posts_with_image("images/b.png").await.unwrap().is_empty());
}

// ─── Chats ───────────────────────────────────────────────────────────────────

#[tokio::test]
async fn find_chat_is_symmetric() {
  let s = store().await;
  let a = user(&s, "a@a.com", "A").await;
  let b = user(&s, "b@b.com", "B").await;

  assert!(s.find_chat(a.user_id, b.user_id).await.unwrap().is_none());

  let chat = s.add_chat(a.user_id, b.user_id).await.unwrap();
  let found = s.find_chat(b.user_id, a.user_id).await.unwrap().unwrap();
  assert_eq!(found.chat_id, chat.chat_id);
  assert_eq!(found.participants, [a.user_id, b.user_id]);
}

#[tokio::test]
async fn messages_are_returned_newest_first() {
  let s = store().await;
  let a = user(&s, "a@a.com", "A").await;
  let b = user(&s, "b@b.com", "B").await;
  let chat = s.add_chat(a.user_id, b.user_id).await.unwrap();

  for (sender, text) in [(&a, "hello"), (&b, "hi there"), (&a, "how are you")] {
    s.append_message(NewMessage {
      chat_id: chat.chat_id,
      content: text.into(),
      sender:  Author { user_id: sender.user_id, name: sender.name.clone() },
    })
    .await
    .unwrap()
    .unwrap();
  }

  let chat = s.get_chat(chat.chat_id).await.unwrap().unwrap();
  let texts: Vec<_> = chat.messages.iter().map(|m| m.content.as_str()).collect();
  assert_eq!(texts, ["how are you", "hi there", "hello"]);
  assert_eq!(chat.messages[1].sender.name, "B");
}

#[tokio::test]
async fn append_to_missing_chat_returns_none() {
  let s = store().await;
  let a = user(&s, "a@a.com", "A").await;
  let result = s
    .append_message(NewMessage {
      chat_id: Uuid::new_v4(),
      content: "hello".into(),
      sender:  Author { user_id: a.user_id, name: a.name },
    })
    .await
    .unwrap();
  assert!(result.is_none());
}

#[tokio::test]
async fn chat_with_self_is_rejected_by_schema() {
  let s = store().await;
  let a = user(&s, "a@a.com", "A").await;
  assert!(s.add_chat(a.user_id, a.user_id).await.is_err());
}

#[tokio::test]
async fn link_chat_requires_existing_chat() {
  let s = store().await;
  let a = user(&s, "a@a.com", "A").await;
  let b = user(&s, "b@b.com", "B").await;
  let chat = s.add_chat(a.user_id, b.user_id).await.unwrap();

  s.link_chat(a.user_id, chat.chat_id).await.unwrap();
  s.link_chat(b.user_id, chat.chat_id).await.unwrap();
  assert!(s.link_chat(a.user_id, Uuid::new_v4()).await.is_err());
}
