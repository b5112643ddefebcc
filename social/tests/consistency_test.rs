use std::collections::BTreeSet;
use std::sync::Arc;

use abi::config::Config;
use abi::errors::ErrorKind;
use abi::model::{Comment, FriendStatus, Message, User};
use db::testing::FlakyStore;
use db::{insert, DocumentStore, MemoryStore};
use social::SocialCore;

fn config() -> Config {
    Config::load("../abi/fixtures/social.yml").unwrap()
}

async fn setup(users: &[&str]) -> (SocialCore, Arc<dyn DocumentStore>) {
    let store: Arc<dyn DocumentStore> = Arc::new(MemoryStore::new());
    for id in users {
        insert(
            store.as_ref(),
            &User::new(format!("{}@social.test", id), "hash").with_id(*id),
        )
        .await
        .unwrap();
    }
    (SocialCore::new(store.clone(), &config()), store)
}

#[tokio::test]
async fn friend_request_flow_ends_in_symmetric_friendship() {
    let (core, _) = setup(&["u1", "u2"]).await;
    let rel = &core.relationships;

    let request = rel.send_friend_request("u1", "u2").await.unwrap();
    assert_eq!(request.status, FriendStatus::Pending);
    assert_eq!(
        rel.received_by("u2", FriendStatus::Pending).await.unwrap(),
        vec![request.clone()]
    );

    rel.accept_friend_request("u2", "u1").await.unwrap();
    assert_eq!(
        rel.friends_of("u1").await.unwrap(),
        BTreeSet::from(["u2".to_string()])
    );
    assert_eq!(
        rel.friends_of("u2").await.unwrap(),
        BTreeSet::from(["u1".to_string()])
    );
    // accepting by user ids does not move the request out of pending
    assert_eq!(rel.sent_by("u1").await.unwrap()[0].status, FriendStatus::Pending);
}

#[tokio::test]
async fn every_accepted_pair_is_symmetric() {
    let ids = ["a", "b", "c", "d"];
    let (core, _) = setup(&ids).await;
    let rel = &core.relationships;

    for (x, y) in [("a", "b"), ("b", "c"), ("c", "a"), ("d", "a"), ("a", "b")] {
        rel.accept_friend_request(x, y).await.unwrap();
    }

    for id in ids {
        for friend in rel.friends_of(id).await.unwrap() {
            assert!(
                rel.friends_of(&friend).await.unwrap().contains(id),
                "{} lists {} but not the other way round",
                id,
                friend
            );
        }
    }
    assert_eq!(rel.friends_of("a").await.unwrap().len(), 3);
}

#[tokio::test]
async fn partial_accept_is_reported_then_reconciled() {
    let memory: Arc<dyn DocumentStore> = Arc::new(MemoryStore::new());
    for id in ["u1", "u2"] {
        insert(memory.as_ref(), &User::new(format!("{}@x", id), "h").with_id(id))
            .await
            .unwrap();
    }
    let flaky = Arc::new(FlakyStore::new(memory));
    let core = SocialCore::new(flaky.clone(), &config());

    flaky.fail_after(1);
    let err = core
        .relationships
        .accept_friend_request("u1", "u2")
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Unavailable);
    assert_eq!(err.status_code(), 503);

    flaky.heal();
    assert_eq!(core.relationships.reconcile_all().await.unwrap(), 1);
    assert!(core.relationships.friends_of("u2").await.unwrap().contains("u1"));
}

#[tokio::test]
async fn likes_and_comments_keep_their_invariants() {
    let (core, _) = setup(&[]).await;
    let posts = &core.engagement;
    let id = posts.create_post("u1", "post").await.unwrap().id.unwrap();

    posts.add_like(&id, "u5").await.unwrap();
    let post = posts.add_like(&id, "u5").await.unwrap();
    assert_eq!(post.likes, BTreeSet::from(["u5".to_string()]));

    let before = post.comments.len();
    let mut post = post;
    for i in 0..5 {
        post = posts
            .add_comment(&id, Comment::new("u5", format!("c{}", i)))
            .await
            .unwrap();
    }
    assert_eq!(post.comments.len(), before + 5);
    let texts: Vec<_> = post.comments.iter().map(|c| c.text.clone()).collect();
    assert_eq!(texts, ["c0", "c1", "c2", "c3", "c4"]);
    // likes untouched by commenting
    assert_eq!(post.likes.len(), 1);
}

#[tokio::test]
async fn read_state_only_moves_forward() {
    let (core, _) = setup(&[]).await;
    let chat = &core.conversations;

    let sent = chat
        .send_message(Message::new("u1", "u2", "hey"))
        .await
        .unwrap();
    let id = sent.id.unwrap();
    assert!(!sent.is_read);

    chat.mark_as_read(&id).await.unwrap();
    chat.mark_as_read(&id).await.unwrap();
    assert!(chat.unread_for("u2").await.unwrap().is_empty());
    assert!(chat.messages_between("u1", "u2").await.unwrap()[0].is_read);
    assert!(chat.messages_between("u2", "u1").await.unwrap().is_empty());
}

#[tokio::test]
async fn unknown_ids_map_to_not_found() {
    let (core, _) = setup(&["u1"]).await;
    let errors = [
        core.relationships
            .reject_friend_request("nope")
            .await
            .unwrap_err(),
        core.relationships
            .accept_friend_request("u1", "nope")
            .await
            .unwrap_err(),
        core.engagement.add_like("nope", "u1").await.unwrap_err(),
        core.conversations.mark_as_read("nope").await.unwrap_err(),
    ];
    for err in errors {
        assert_eq!(err.kind(), ErrorKind::NotFound);
        assert_eq!(err.status_code(), 404);
    }

    let err = core
        .relationships
        .send_friend_request("u1", "u1")
        .await
        .unwrap_err();
    assert_eq!(err.status_code(), 400);
}
