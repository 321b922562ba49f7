//! Folder-hierarchy resolution
//!
//! Zephyr returns folders as a flat list with parent ids. Lineage is the chain
//! of ancestors from the immediate parent up to the root.

use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

use super::apis;
use super::types::{Folder, FolderType};
use super::ZephyrError;
use crate::driver::traits::HttpClient;

/// One ancestor in a folder's lineage
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Ancestor {
    pub name: String,
    pub id: u64,
}

/// Folder decorated with its lineage, nearest ancestor first
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FolderLineage {
    pub name: String,
    pub id: u64,
    pub parent: Vec<Ancestor>,
}

/// Result of an existence check
#[derive(Debug, Clone, Default)]
pub struct FolderCheck {
    pub folders_map: Vec<FolderLineage>,
    pub folder_exists: Vec<FolderLineage>,
}

impl FolderCheck {
    /// First matching folder; duplicates are not disambiguated further
    pub fn first_match(&self) -> Option<&FolderLineage> {
        self.folder_exists.first()
    }
}

/// Decorate every folder with its ancestor chain
///
/// A parent id that is missing from the listing truncates the lineage, as
/// does a parent already seen on the same walk.
pub fn build_lineage(folders: &[Folder]) -> Vec<FolderLineage> {
    let by_id: HashMap<u64, &Folder> = folders.iter().map(|f| (f.id, f)).collect();

    folders
        .iter()
        .map(|folder| {
            let mut parent = Vec::new();
            let mut seen = HashSet::from([folder.id]);
            let mut current = folder;

            while let Some(parent_id) = current.parent_id {
                let Some(next) = by_id.get(&parent_id) else {
                    break;
                };
                if !seen.insert(next.id) {
                    break;
                }
                parent.push(Ancestor {
                    name: next.name.clone(),
                    id: next.id,
                });
                current = next;
            }

            FolderLineage {
                name: folder.name.clone(),
                id: folder.id,
                parent,
            }
        })
        .collect()
}

/// Folders named `folder_name` whose ancestor names all appear in `expected_parents`
///
/// Containment is unordered: ancestors drawn from the expected names in any
/// order still match.
pub fn matching_folders(
    folders_map: &[FolderLineage],
    folder_name: &str,
    expected_parents: &[String],
) -> Vec<FolderLineage> {
    folders_map
        .iter()
        .filter(|folder| folder.name == folder_name)
        .filter(|folder| {
            folder
                .parent
                .iter()
                .all(|ancestor| expected_parents.contains(&ancestor.name))
        })
        .cloned()
        .collect()
}

/// Fetch the project's folders and look for `folder_name` under `expected_parents`
pub async fn check_folders_exist(
    client: &dyn HttpClient,
    folder_type: FolderType,
    project_key: &str,
    folder_name: &str,
    expected_parents: &[String],
    log: bool,
) -> Result<FolderCheck, ZephyrError> {
    let folders = apis::get_folders(client, folder_type, project_key, log).await?;
    let folders_map = build_lineage(&folders.values);
    let folder_exists = matching_folders(&folders_map, folder_name, expected_parents);

    log::debug!(
        "{} folder(s) named '{}' under {:?}",
        folder_exists.len(),
        folder_name,
        expected_parents
    );

    Ok(FolderCheck {
        folders_map,
        folder_exists,
    })
}
