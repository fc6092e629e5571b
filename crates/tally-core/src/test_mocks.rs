//! Mock implementations for testing the sync orchestrator.
//!
//! These mocks implement the mirror traits from tally-git so sync logic can
//! be tested without real repositories or a network.

use std::cell::RefCell;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::rc::Rc;

use chrono::DateTime;
use tally_git::{CommitRecord, Error as GitError, MirrorHandle, MirrorOps, Result as GitResult};

/// A commit on a mock remote; may be unreadable on purpose.
#[derive(Debug, Clone)]
pub enum MockCommit {
    Good(CommitRecord),
    BadTimestamp(String),
    MissingObject(String),
}

impl MockCommit {
    pub fn good(hash: &str, author: &str, email: &str, seconds: i64) -> Self {
        Self::Good(CommitRecord {
            hash: hash.to_string(),
            author_name: author.to_string(),
            author_email: email.to_string(),
            commit_time: DateTime::from_timestamp(seconds, 0).unwrap(),
            message: format!("commit {hash}\n"),
        })
    }

    pub fn bad_timestamp(hash: &str) -> Self {
        Self::BadTimestamp(hash.to_string())
    }

    pub fn missing_object(hash: &str) -> Self {
        Self::MissingObject(hash.to_string())
    }

    fn to_item(&self) -> GitResult<CommitRecord> {
        match self {
            Self::Good(record) => Ok(record.clone()),
            Self::BadTimestamp(hash) => Err(GitError::InvalidTimestamp {
                hash: hash.clone(),
                seconds: i64::MAX,
            }),
            Self::MissingObject(hash) => Err(GitError::UnreadableCommit {
                hash: hash.clone(),
                source: git2::Error::from_str("object not found"),
            }),
        }
    }
}

#[derive(Default)]
struct MockRemote {
    commits: Vec<MockCommit>,
    fail_fetch: bool,
    unreadable: bool,
}

/// A local mirror as the mock sees it.
pub struct MockMirror {
    url: String,
    remote: Rc<RefCell<MockRemote>>,
    head: RefCell<Vec<MockCommit>>,
    fetched: RefCell<Vec<MockCommit>>,
    steps: RefCell<Vec<&'static str>>,
}

/// Handle returned by [`MockMirrors`].
pub struct MockHandle(Rc<MockMirror>);

/// Mock implementation of `MirrorOps`.
///
/// Remotes are keyed by clone URL (`mock://owner/project`); mirrors by
/// destination path. Nothing touches the filesystem.
#[derive(Default)]
pub struct MockMirrors {
    remotes: RefCell<HashMap<String, Rc<RefCell<MockRemote>>>>,
    mirrors: RefCell<HashMap<PathBuf, Rc<MockMirror>>>,
    clones: RefCell<Vec<String>>,
}

impl MockMirrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_remote(self, name: &str, commits: Vec<MockCommit>) -> Self {
        let remote = MockRemote {
            commits,
            ..MockRemote::default()
        };
        self.remotes
            .borrow_mut()
            .insert(url_for(name), Rc::new(RefCell::new(remote)));
        self
    }

    pub fn push_commit(&self, name: &str, commit: MockCommit) {
        self.remote(name).borrow_mut().commits.push(commit);
    }

    pub fn fail_fetch(&self, name: &str) {
        self.remote(name).borrow_mut().fail_fetch = true;
    }

    pub fn make_unreadable(&self, name: &str) {
        self.remote(name).borrow_mut().unreadable = true;
    }

    /// URLs cloned so far, in order.
    pub fn cloned_urls(&self) -> Vec<String> {
        self.clones.borrow().clone()
    }

    /// Update steps run against the mirror of `name`.
    pub fn steps(&self, name: &str) -> Vec<&'static str> {
        let url = url_for(name);
        self.mirrors
            .borrow()
            .values()
            .find(|mirror| mirror.url == url)
            .map(|mirror| mirror.steps.borrow().clone())
            .unwrap_or_default()
    }

    fn remote(&self, name: &str) -> Rc<RefCell<MockRemote>> {
        Rc::clone(&self.remotes.borrow()[&url_for(name)])
    }
}

fn url_for(name: &str) -> String {
    format!("mock://{name}")
}

impl MirrorOps for MockMirrors {
    type Handle = MockHandle;

    fn clone_url(&self, name: &str) -> String {
        url_for(name)
    }

    fn clone_mirror(&self, url: &str, dest: &Path) -> GitResult<MockHandle> {
        let remote = self
            .remotes
            .borrow()
            .get(url)
            .cloned()
            .ok_or_else(|| GitError::RemoteNotFound(url.to_string()))?;

        let head = remote.borrow().commits.clone();
        let mirror = Rc::new(MockMirror {
            url: url.to_string(),
            remote,
            head: RefCell::new(head),
            fetched: RefCell::new(Vec::new()),
            steps: RefCell::new(Vec::new()),
        });

        self.mirrors
            .borrow_mut()
            .insert(dest.to_path_buf(), Rc::clone(&mirror));
        self.clones.borrow_mut().push(url.to_string());
        Ok(MockHandle(mirror))
    }

    fn open_mirror(&self, dest: &Path) -> GitResult<MockHandle> {
        self.mirrors
            .borrow()
            .get(dest)
            .map(|mirror| MockHandle(Rc::clone(mirror)))
            .ok_or_else(|| GitError::NotFound(dest.to_path_buf()))
    }
}

impl MirrorHandle for MockHandle {
    fn fetch(&self) -> GitResult<()> {
        self.0.steps.borrow_mut().push("fetch");
        let remote = self.0.remote.borrow();
        if remote.fail_fetch {
            return Err(GitError::Network("connection refused".to_string()));
        }
        *self.0.fetched.borrow_mut() = remote.commits.clone();
        Ok(())
    }

    fn update_head_to_fetched(&self) -> GitResult<()> {
        self.0.steps.borrow_mut().push("update_head");
        let fetched = self.0.fetched.borrow().clone();
        *self.0.head.borrow_mut() = fetched;
        Ok(())
    }

    fn sync_remote_branches(&self) -> GitResult<()> {
        self.0.steps.borrow_mut().push("sync_branches");
        Ok(())
    }

    fn prune_remote_branches(&self) -> GitResult<()> {
        self.0.steps.borrow_mut().push("prune");
        Ok(())
    }

    fn compact(&self) -> GitResult<()> {
        self.0.steps.borrow_mut().push("compact");
        Ok(())
    }

    fn walk_history(&self) -> GitResult<impl Iterator<Item = GitResult<CommitRecord>> + '_> {
        if self.0.remote.borrow().unreadable {
            return Err(GitError::Unreadable("bad object HEAD".to_string()));
        }
        let items: Vec<_> = self.0.head.borrow().iter().map(MockCommit::to_item).collect();
        Ok(items.into_iter())
    }
}
