//! Project hierarchy.
//!
//! The server returns projects as a flat list in no particular order; a
//! child may be listed before its parent. [`ProjectTree::resolve`] links
//! them with a work queue and rejects listings that cannot form a forest.

use std::collections::{HashMap, HashSet, VecDeque};

use tableau_send_protocol::Project;
use tracing::debug;

use crate::error::Error;

/// Projects linked into a forest.
#[derive(Debug, Clone, Default)]
pub struct ProjectTree {
    projects: HashMap<String, Project>,
    children: HashMap<String, Vec<String>>,
    roots: Vec<String>,
}

impl ProjectTree {
    /// Links a flat project listing into a tree.
    ///
    /// A project is linked once it is a root or its parent is linked. A
    /// project that comes back around the queue with nothing linked in
    /// between can never be placed (cycle or missing parent), and the
    /// whole listing is rejected with [`Error::InconsistentProjects`].
    pub fn resolve(projects: Vec<Project>) -> Result<Self, Error> {
        let mut tree = Self::default();
        let mut queue: VecDeque<Project> = projects.into();
        let mut deferred: HashSet<String> = HashSet::new();

        while let Some(project) = queue.pop_front() {
            if tree.projects.contains_key(&project.id) {
                return Err(Error::InconsistentProjects(vec![project.id]));
            }

            let linkable = match project.parent_id() {
                None => true,
                Some(parent) => tree.projects.contains_key(parent),
            };

            if linkable {
                tree.link(project);
                deferred.clear();
            } else if deferred.contains(&project.id) {
                let mut unresolved: Vec<String> = queue.into_iter().map(|p| p.id).collect();
                unresolved.push(project.id);
                unresolved.sort();
                return Err(Error::InconsistentProjects(unresolved));
            } else {
                deferred.insert(project.id.clone());
                queue.push_back(project);
            }
        }

        debug!(projects = tree.len(), roots = tree.roots.len(), "resolved project tree");
        Ok(tree)
    }

    fn link(&mut self, project: Project) {
        match project.parent_id() {
            Some(parent) => self
                .children
                .entry(parent.to_string())
                .or_default()
                .push(project.id.clone()),
            None => self.roots.push(project.id.clone()),
        }
        self.projects.insert(project.id.clone(), project);
    }

    pub fn len(&self) -> usize {
        self.projects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.projects.is_empty()
    }

    pub fn get(&self, id: &str) -> Option<&Project> {
        self.projects.get(id)
    }

    /// Top-level projects, in link order.
    pub fn roots(&self) -> Vec<&Project> {
        self.lookup_all(&self.roots)
    }

    /// Direct children of `id`, in link order.
    pub fn children(&self, id: &str) -> Vec<&Project> {
        self.children
            .get(id)
            .map(|ids| self.lookup_all(ids))
            .unwrap_or_default()
    }

    pub fn parent(&self, id: &str) -> Option<&Project> {
        self.get(id)?.parent_id().and_then(|p| self.get(p))
    }

    /// Projects from the root down to `id`, inclusive.
    pub fn path(&self, id: &str) -> Vec<&Project> {
        let mut chain = Vec::new();
        let mut current = self.get(id);
        while let Some(project) = current {
            chain.push(project);
            current = project.parent_id().and_then(|p| self.get(p));
        }
        chain.reverse();
        chain
    }

    /// Slash-separated names from the root, e.g. `Finance/Reports`.
    pub fn display_path(&self, id: &str) -> Option<String> {
        self.get(id)?;
        let names: Vec<&str> = self.path(id).iter().map(|p| p.name.as_str()).collect();
        Some(names.join("/"))
    }

    /// Finds a project by its slash-separated display path.
    pub fn find_by_path(&self, path: &str) -> Option<&Project> {
        let mut level = self.roots();
        let mut found = None;
        for segment in path.trim_matches('/').split('/') {
            let project = level.into_iter().find(|p| p.name == segment)?;
            level = self.children(&project.id);
            found = Some(project);
        }
        found
    }

    /// Finds the only project named `name`, anywhere in the tree.
    pub fn find_by_name(&self, name: &str) -> Result<&Project, Error> {
        let mut matches: Vec<&Project> = self.projects.values().filter(|p| p.name == name).collect();
        match matches.len() {
            0 => Err(Error::ProjectNotFound(name.to_string())),
            1 => Ok(matches.remove(0)),
            _ => {
                let mut ids: Vec<String> = matches.iter().map(|p| p.id.clone()).collect();
                ids.sort();
                Err(Error::AmbiguousProject {
                    name: name.to_string(),
                    ids,
                })
            }
        }
    }

    /// Resolves a user-supplied project reference.
    ///
    /// Tries the display path first, then falls back to a unique name for
    /// references without a slash.
    pub fn lookup(&self, reference: &str) -> Result<&Project, Error> {
        if let Some(project) = self.find_by_path(reference) {
            return Ok(project);
        }
        if reference.contains('/') {
            return Err(Error::ProjectNotFound(reference.to_string()));
        }
        self.find_by_name(reference)
    }

    /// Depth-first pre-order traversal yielding `(depth, project)`.
    pub fn walk(&self) -> Vec<(usize, &Project)> {
        let mut out = Vec::with_capacity(self.len());
        let mut stack: Vec<(usize, &Project)> =
            self.roots().into_iter().rev().map(|p| (0, p)).collect();
        while let Some((depth, project)) = stack.pop() {
            out.push((depth, project));
            for child in self.children(&project.id).into_iter().rev() {
                stack.push((depth + 1, child));
            }
        }
        out
    }

    fn lookup_all(&self, ids: &[String]) -> Vec<&Project> {
        ids.iter().filter_map(|id| self.projects.get(id)).collect()
    }
}
