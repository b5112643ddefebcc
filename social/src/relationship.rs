use std::collections::BTreeSet;
use std::sync::Arc;

use tracing::{debug, error, info, warn};

use abi::config::ConsistencyConfig;
use abi::errors::{Error, Result};
use abi::model::{FriendRequest, FriendStatus, Record, User};
use abi::utils;
use db::{find, insert, query, update_with_retry, DocumentStore};

/// friend-request lifecycle and the symmetric friend lists it produces
#[derive(Debug, Clone)]
pub struct RelationshipManager {
    store: Arc<dyn DocumentStore>,
    consistency: ConsistencyConfig,
}

impl RelationshipManager {
    pub fn new(store: Arc<dyn DocumentStore>, consistency: ConsistencyConfig) -> Self {
        Self { store, consistency }
    }

    /// create a pending request from `sender_id` to `receiver_id`.
    ///
    /// Several pending requests between the same pair are allowed unless
    /// `reject_duplicate_requests` is configured.
    pub async fn send_friend_request(
        &self,
        sender_id: &str,
        receiver_id: &str,
    ) -> Result<FriendRequest> {
        if sender_id == receiver_id {
            return Err(Error::invalid_operation(format!(
                "user {} cannot send a friend request to themselves",
                sender_id
            )));
        }

        if self.consistency.reject_duplicate_requests {
            let pending: Vec<FriendRequest> = query(
                self.store.as_ref(),
                &[
                    ("sender_id", sender_id.into()),
                    ("receiver_id", receiver_id.into()),
                    ("status", FriendStatus::Pending.as_str().into()),
                ],
            )
            .await?;
            if !pending.is_empty() {
                return Err(Error::duplicate_request(format!(
                    "{} already has a pending request to {}",
                    sender_id, receiver_id
                )));
            }
        }

        let request = FriendRequest::pending(sender_id, receiver_id, utils::now_millis());
        let request = insert(self.store.as_ref(), &request).await?;
        debug!("friend request {:?} sent", request.id);
        Ok(request)
    }

    /// mark the request rejected whatever its current status
    pub async fn reject_friend_request(&self, request_id: &str) -> Result<()> {
        let mut request = self.request(request_id).await?;
        if request.status != FriendStatus::Pending {
            debug!(
                "rejecting friend request {} that is already {}",
                request_id, request.status
            );
        }
        request.status = FriendStatus::Rejected;
        insert(self.store.as_ref(), &request).await?;
        Ok(())
    }

    /// link two users as friends: each id is added to the other's list.
    ///
    /// Repeating the call changes nothing. The request record, if any, is not
    /// touched; see [`Self::accept_request`]. The two user writes are separate,
    /// a failure of the second is returned as is and leaves `friend_id`
    /// without the back-edge until [`Self::reconcile`] runs.
    pub async fn accept_friend_request(&self, user_id: &str, friend_id: &str) -> Result<()> {
        if user_id == friend_id {
            return Err(Error::invalid_operation(format!(
                "user {} cannot befriend themselves",
                user_id
            )));
        }

        // both must resolve before anything is written
        self.user(user_id).await?;
        self.user(friend_id).await?;

        self.link(user_id, friend_id).await?;
        if let Err(e) = self.link(friend_id, user_id).await {
            error!(
                "friendship {} -> {} written but {} -> {} failed: {}",
                user_id, friend_id, friend_id, user_id, e
            );
            return Err(e);
        }
        debug!("{} and {} are friends", user_id, friend_id);
        Ok(())
    }

    /// accept a pending request by id: link sender and receiver, then record
    /// the request as accepted
    pub async fn accept_request(&self, request_id: &str) -> Result<FriendRequest> {
        let mut request = self.request(request_id).await?;
        if request.status != FriendStatus::Pending {
            return Err(Error::invalid_operation(format!(
                "friend request {} is {}, not pending",
                request_id, request.status
            )));
        }

        self.accept_friend_request(&request.receiver_id, &request.sender_id)
            .await?;

        request.status = FriendStatus::Accepted;
        insert(self.store.as_ref(), &request).await
    }

    pub async fn sent_by(&self, sender_id: &str) -> Result<Vec<FriendRequest>> {
        query(self.store.as_ref(), &[("sender_id", sender_id.into())]).await
    }

    pub async fn received_by(
        &self,
        receiver_id: &str,
        status: FriendStatus,
    ) -> Result<Vec<FriendRequest>> {
        query(
            self.store.as_ref(),
            &[
                ("receiver_id", receiver_id.into()),
                ("status", status.as_str().into()),
            ],
        )
        .await
    }

    /// every request addressed to the user, whatever its status
    pub async fn received_by_any(&self, receiver_id: &str) -> Result<Vec<FriendRequest>> {
        query(self.store.as_ref(), &[("receiver_id", receiver_id.into())]).await
    }

    pub async fn friends_of(&self, user_id: &str) -> Result<BTreeSet<String>> {
        Ok(self.user(user_id).await?.friends)
    }

    /// restore symmetry around one user, returns the number of edges added.
    ///
    /// Adds the missing back-edge for every friend the user lists and adopts
    /// every user that lists this one. Edges are never removed.
    pub async fn reconcile(&self, user_id: &str) -> Result<usize> {
        let user = self.user(user_id).await?;
        let mut repaired = self.repair_back_edges(&user).await?;

        let listing: Vec<User> = query(self.store.as_ref(), &[("friends", user_id.into())]).await?;
        for other in listing {
            let Some(other_id) = other.id.as_deref() else {
                continue;
            };
            if !user.is_friend(other_id) && other_id != user_id {
                self.link(user_id, other_id).await?;
                repaired += 1;
            }
        }

        if repaired > 0 {
            info!("reconciled {} edges around user {}", repaired, user_id);
        }
        Ok(repaired)
    }

    /// restore symmetry over the whole graph, returns the number of edges added
    pub async fn reconcile_all(&self) -> Result<usize> {
        let users: Vec<User> = query(self.store.as_ref(), &[]).await?;
        let mut repaired = 0;
        for user in &users {
            repaired += self.repair_back_edges(user).await?;
        }
        info!(
            "reconciled {} edges over {} users",
            repaired,
            users.len()
        );
        Ok(repaired)
    }

    /// for every friend `user` lists, make sure the friend lists `user` back
    async fn repair_back_edges(&self, user: &User) -> Result<usize> {
        let Some(user_id) = user.id.as_deref() else {
            return Ok(0);
        };
        let mut repaired = 0;
        for friend_id in &user.friends {
            match find::<User>(self.store.as_ref(), friend_id).await? {
                None => warn!("user {} lists unknown friend {}", user_id, friend_id),
                Some(friend) if friend.is_friend(user_id) => {}
                Some(_) => {
                    self.link(friend_id, user_id).await?;
                    repaired += 1;
                }
            }
        }
        Ok(repaired)
    }

    /// add `friend_id` to the friend list of `user_id`
    async fn link(&self, user_id: &str, friend_id: &str) -> Result<User> {
        let friend_id = friend_id.to_string();
        update_with_retry(
            self.store.as_ref(),
            user_id,
            self.consistency.max_retries,
            |user: &mut User| Ok(user.friends.insert(friend_id.clone())),
        )
        .await
    }

    async fn user(&self, user_id: &str) -> Result<User> {
        find(self.store.as_ref(), user_id)
            .await?
            .ok_or_else(|| Error::not_found_with_details(format!("user {}", user_id)))
    }

    async fn request(&self, request_id: &str) -> Result<FriendRequest> {
        find(self.store.as_ref(), request_id).await?.ok_or_else(|| {
            Error::not_found_with_details(format!("{} {}", FriendRequest::COLLECTION, request_id))
        })
    }
}
