use super::{BackupStore, StoreEntry};
use crate::model::ArtifactKind;
use std::cell::RefCell;
use std::collections::{BTreeMap, HashSet};
use std::io;
use std::path::{Component, Path, PathBuf};

#[derive(Debug, Clone, PartialEq, Eq)]
enum Node {
    File(Vec<u8>),
    Dir,
}

/// In-memory tree of files and directories, for tests.
///
/// Paths are absolute and compared lexically. Uses `RefCell` so the store can be
/// shared by reference like the filesystem it stands in for.
#[derive(Debug)]
pub struct MemStore {
    nodes: RefCell<BTreeMap<PathBuf, Node>>,
    simulate_write_error: RefCell<bool>,
    failing_removals: RefCell<HashSet<PathBuf>>,
    racing_removals: RefCell<HashSet<PathBuf>>,
    removals: RefCell<Vec<PathBuf>>,
}

impl Default for MemStore {
    fn default() -> Self {
        let mut nodes = BTreeMap::new();
        nodes.insert(PathBuf::from("/"), Node::Dir);
        Self {
            nodes: RefCell::new(nodes),
            simulate_write_error: RefCell::new(false),
            failing_removals: RefCell::new(HashSet::new()),
            racing_removals: RefCell::new(HashSet::new()),
            removals: RefCell::new(Vec::new()),
        }
    }
}

fn normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::from("/");
    for component in path.components() {
        match component {
            Component::Normal(part) => out.push(part),
            Component::ParentDir => {
                out.pop();
            }
            Component::RootDir | Component::CurDir | Component::Prefix(_) => {}
        }
    }
    out
}

fn not_found(path: &Path) -> io::Error {
    io::Error::new(
        io::ErrorKind::NotFound,
        format!("no such entry: {}", path.display()),
    )
}

impl MemStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Test helper: create a directory and any missing parents.
    pub fn add_dir(&self, path: impl AsRef<Path>) -> &Self {
        let path = normalize(path.as_ref());
        let mut nodes = self.nodes.borrow_mut();
        for ancestor in path.ancestors() {
            nodes.entry(ancestor.to_path_buf()).or_insert(Node::Dir);
        }
        self
    }

    /// Test helper: create a file (and its parents) with the given content.
    pub fn add_file(&self, path: impl AsRef<Path>, content: impl AsRef<[u8]>) -> &Self {
        let path = normalize(path.as_ref());
        if let Some(parent) = path.parent() {
            self.add_dir(parent);
        }
        self.nodes
            .borrow_mut()
            .insert(path, Node::File(content.as_ref().to_vec()));
        self
    }

    pub fn read_file(&self, path: impl AsRef<Path>) -> Option<Vec<u8>> {
        match self.nodes.borrow().get(&normalize(path.as_ref())) {
            Some(Node::File(content)) => Some(content.clone()),
            _ => None,
        }
    }

    pub fn exists(&self, path: impl AsRef<Path>) -> bool {
        self.nodes
            .borrow()
            .contains_key(&normalize(path.as_ref()))
    }

    /// Names of the direct children of `dir`, sorted.
    pub fn children(&self, dir: impl AsRef<Path>) -> Vec<String> {
        let dir = normalize(dir.as_ref());
        self.nodes
            .borrow()
            .keys()
            .filter(|p| p.parent() == Some(dir.as_path()))
            .filter_map(|p| p.file_name())
            .map(|n| n.to_string_lossy().into_owned())
            .collect()
    }

    /// Every path handed to a successful `remove`, in call order.
    pub fn removals(&self) -> Vec<PathBuf> {
        self.removals.borrow().clone()
    }

    /// Make every copy fail, as a full or read-only destination would.
    pub fn set_simulate_write_error(&self, simulate: bool) {
        *self.simulate_write_error.borrow_mut() = simulate;
    }

    /// Make removal of `path` fail with a permission error.
    pub fn fail_removal_of(&self, path: impl AsRef<Path>) {
        self.failing_removals
            .borrow_mut()
            .insert(normalize(path.as_ref()));
    }

    /// Simulate another process deleting `path` right before we do: the entry vanishes
    /// and our own removal reports `NotFound`.
    pub fn race_removal_of(&self, path: impl AsRef<Path>) {
        self.racing_removals
            .borrow_mut()
            .insert(normalize(path.as_ref()));
    }

    fn check_writable(&self, path: &Path) -> io::Result<()> {
        if *self.simulate_write_error.borrow() {
            return Err(io::Error::new(
                io::ErrorKind::PermissionDenied,
                format!("simulated write error: {}", path.display()),
            ));
        }
        Ok(())
    }

    fn require_parent_dir(nodes: &BTreeMap<PathBuf, Node>, path: &Path) -> io::Result<()> {
        let parent = path.parent().ok_or_else(|| not_found(path))?;
        match nodes.get(parent) {
            Some(Node::Dir) => Ok(()),
            Some(Node::File(_)) => Err(io::Error::new(
                io::ErrorKind::NotADirectory,
                format!("not a directory: {}", parent.display()),
            )),
            None => Err(not_found(parent)),
        }
    }

    fn drop_subtree(nodes: &mut BTreeMap<PathBuf, Node>, root: &Path) {
        nodes.retain(|p, _| !p.starts_with(root));
    }
}

impl BackupStore for MemStore {
    fn kind_of(&self, path: &Path) -> io::Result<Option<ArtifactKind>> {
        Ok(self
            .nodes
            .borrow()
            .get(&normalize(path))
            .map(|node| match node {
                Node::File(_) => ArtifactKind::File,
                Node::Dir => ArtifactKind::Directory,
            }))
    }

    fn list_dir(&self, dir: &Path) -> io::Result<Vec<StoreEntry>> {
        let dir = normalize(dir);
        let nodes = self.nodes.borrow();
        match nodes.get(&dir) {
            Some(Node::Dir) => {}
            Some(Node::File(_)) => {
                return Err(io::Error::new(
                    io::ErrorKind::NotADirectory,
                    format!("not a directory: {}", dir.display()),
                ));
            }
            None => return Err(not_found(&dir)),
        }
        Ok(nodes
            .keys()
            .filter(|p| p.parent() == Some(dir.as_path()))
            .filter_map(|p| {
                p.file_name().map(|name| StoreEntry {
                    name: name.to_os_string(),
                    path: p.clone(),
                })
            })
            .collect())
    }

    fn create_dir(&self, path: &Path) -> io::Result<()> {
        let path = normalize(path);
        let mut nodes = self.nodes.borrow_mut();
        if nodes.contains_key(&path) {
            return Err(io::Error::new(
                io::ErrorKind::AlreadyExists,
                format!("already exists: {}", path.display()),
            ));
        }
        Self::require_parent_dir(&nodes, &path)?;
        nodes.insert(path, Node::Dir);
        Ok(())
    }

    fn copy_file(&self, src: &Path, dst: &Path) -> io::Result<()> {
        let (src, dst) = (normalize(src), normalize(dst));
        self.check_writable(&dst)?;
        let mut nodes = self.nodes.borrow_mut();
        let content = match nodes.get(&src) {
            Some(Node::File(content)) => content.clone(),
            Some(Node::Dir) => {
                return Err(io::Error::new(
                    io::ErrorKind::IsADirectory,
                    format!("is a directory: {}", src.display()),
                ));
            }
            None => return Err(not_found(&src)),
        };
        Self::require_parent_dir(&nodes, &dst)?;
        if let Some(Node::Dir) = nodes.get(&dst) {
            return Err(io::Error::new(
                io::ErrorKind::IsADirectory,
                format!("is a directory: {}", dst.display()),
            ));
        }
        nodes.insert(dst, Node::File(content));
        Ok(())
    }

    fn copy_dir(&self, src: &Path, dst: &Path) -> io::Result<()> {
        let (src, dst) = (normalize(src), normalize(dst));
        self.check_writable(&dst)?;
        let mut nodes = self.nodes.borrow_mut();
        if nodes.get(&src) != Some(&Node::Dir) {
            return Err(not_found(&src));
        }
        if nodes.contains_key(&dst) {
            return Err(io::Error::new(
                io::ErrorKind::AlreadyExists,
                format!("already exists: {}", dst.display()),
            ));
        }
        Self::require_parent_dir(&nodes, &dst)?;

        let copied: Vec<(PathBuf, Node)> = nodes
            .iter()
            .filter_map(|(p, node)| {
                p.strip_prefix(&src)
                    .ok()
                    .map(|rel| (dst.join(rel), node.clone()))
            })
            .collect();
        nodes.extend(copied);
        Ok(())
    }

    fn remove(&self, path: &Path, kind: ArtifactKind) -> io::Result<()> {
        let path = normalize(path);
        if self.failing_removals.borrow().contains(&path) {
            return Err(io::Error::new(
                io::ErrorKind::PermissionDenied,
                format!("permission denied: {}", path.display()),
            ));
        }

        let mut nodes = self.nodes.borrow_mut();
        if self.racing_removals.borrow_mut().remove(&path) {
            Self::drop_subtree(&mut nodes, &path);
            return Err(not_found(&path));
        }

        let is_dir = match nodes.get(&path) {
            None => return Err(not_found(&path)),
            Some(node) => *node == Node::Dir,
        };
        match (is_dir, kind) {
            (true, ArtifactKind::File) => {
                return Err(io::Error::new(
                    io::ErrorKind::IsADirectory,
                    format!("is a directory: {}", path.display()),
                ));
            }
            (true, ArtifactKind::Directory) => Self::drop_subtree(&mut nodes, &path),
            (false, _) => {
                nodes.remove(&path);
            }
        }
        self.removals.borrow_mut().push(path);
        Ok(())
    }

    fn canonicalize(&self, path: &Path) -> io::Result<PathBuf> {
        let path = normalize(path);
        if self.nodes.borrow().contains_key(&path) {
            Ok(path)
        } else {
            Err(not_found(&path))
        }
    }
}
