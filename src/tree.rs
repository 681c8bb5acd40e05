// src/tree.rs - Family tree assembly over the flat people list
use serde::Serialize;
use std::collections::{HashMap, HashSet};

use crate::models::Person;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FamilyNode {
    pub person: Person,
    pub children: Vec<FamilyNode>,
}

impl FamilyNode {
    /// Number of people in this subtree, including the root.
    pub fn size(&self) -> usize {
        let mut count = 0;
        let mut pending = vec![self];
        while let Some(node) = pending.pop() {
            count += 1;
            pending.extend(node.children.iter());
        }
        count
    }

    /// Depth-first walk yielding each node with its generation below this one.
    pub fn walk(&self) -> Vec<(usize, &FamilyNode)> {
        let mut out = Vec::new();
        let mut pending = vec![(0, self)];
        while let Some((depth, node)) = pending.pop() {
            out.push((depth, node));
            pending.extend(node.children.iter().rev().map(|child| (depth + 1, child)));
        }
        out
    }
}

// Long father chains would otherwise drop one generation per stack frame.
impl Drop for FamilyNode {
    fn drop(&mut self) {
        let mut pending = std::mem::take(&mut self.children);
        while let Some(mut node) = pending.pop() {
            pending.append(&mut node.children);
        }
    }
}

pub fn find_person<'a>(people: &'a [Person], id: &str) -> Option<&'a Person> {
    people.iter().find(|p| p.id == id)
}

pub fn children_of<'a>(people: &'a [Person], parent_id: &str) -> Vec<&'a Person> {
    people
        .iter()
        .filter(|p| p.father_id.as_deref() == Some(parent_id))
        .collect()
}

/// Case-insensitive substring search over names, as used by the father picker.
/// A blank query returns everyone.
pub fn search_people<'a>(people: &'a [Person], query: &str) -> Vec<&'a Person> {
    let query = query.trim().to_lowercase();
    people
        .iter()
        .filter(|p| p.name.to_lowercase().contains(&query))
        .collect()
}

/// Builds the forest of father/child links. Roots are people without a
/// father or whose father is not in the list. People caught in a father
/// cycle are attached once, as extra roots, so every person appears exactly
/// once.
pub fn build_family_tree(people: &[Person]) -> Vec<FamilyNode> {
    let ids: HashSet<&str> = people.iter().map(|p| p.id.as_str()).collect();
    let mut children_by_father: HashMap<&str, Vec<usize>> = HashMap::new();
    for (idx, person) in people.iter().enumerate() {
        if let Some(father_id) = person.father_id.as_deref() {
            children_by_father.entry(father_id).or_default().push(idx);
        }
    }

    let mut visited = vec![false; people.len()];
    let mut roots = Vec::new();

    for (idx, person) in people.iter().enumerate() {
        let has_known_father = person
            .father_id
            .as_deref()
            .map(|f| ids.contains(f))
            .unwrap_or(false);
        if !has_known_father {
            roots.extend(build_subtree(idx, people, &children_by_father, &mut visited));
        }
    }

    for idx in 0..people.len() {
        if !visited[idx] {
            roots.extend(build_subtree(idx, people, &children_by_father, &mut visited));
        }
    }

    roots
}

/// Claims every unvisited descendant of `root` with an explicit stack, then
/// assembles nodes children-first.
fn build_subtree(
    root: usize,
    people: &[Person],
    children_by_father: &HashMap<&str, Vec<usize>>,
    visited: &mut [bool],
) -> Option<FamilyNode> {
    let mut order = Vec::new();
    let mut kept_children: HashMap<usize, Vec<usize>> = HashMap::new();
    let mut pending = vec![root];
    visited[root] = true;

    while let Some(idx) = pending.pop() {
        order.push(idx);
        let mut kept = Vec::new();
        if let Some(child_indices) = children_by_father.get(people[idx].id.as_str()) {
            for &child_idx in child_indices {
                if !visited[child_idx] {
                    visited[child_idx] = true;
                    kept.push(child_idx);
                    pending.push(child_idx);
                }
            }
        }
        kept_children.insert(idx, kept);
    }

    let mut built: HashMap<usize, FamilyNode> = HashMap::new();
    for &idx in order.iter().rev() {
        let children = kept_children
            .remove(&idx)
            .unwrap_or_default()
            .into_iter()
            .filter_map(|child_idx| built.remove(&child_idx))
            .collect();
        built.insert(
            idx,
            FamilyNode {
                person: people[idx].clone(),
                children,
            },
        );
    }
    built.remove(&root)
}
