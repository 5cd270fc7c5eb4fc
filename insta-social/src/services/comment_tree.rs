//! Threaded comment trees.
//!
//! All comments of a post are fetched in one query and assembled in memory:
//! children are grouped by parent id, then nodes are built bottom-up with an
//! explicit stack. No step recurses, and nesting is capped at a configurable
//! depth so serializing or dropping a tree never recurses unboundedly either.
//!
//! Ordering: top-level comments newest first, replies oldest first. Ties on
//! `created_date` keep insertion (id) order.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use diesel::pg::PgConnection;
use diesel::prelude::*;
use serde::Serialize;

use crate::models::{Comment, UserSummary};
use crate::schema::comments;
use crate::services::{counters, user_service};

/// A comment joined with its author.
#[derive(Debug, Clone)]
pub struct CommentRow {
    pub comment: Comment,
    pub user: UserSummary,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct CommentNode {
    pub id: i64,
    pub user: UserSummary,
    pub text: Option<String>,
    pub parent: Option<i64>,
    pub created_date: DateTime<Utc>,
    pub likes_count: i64,
    pub subcomments: Vec<CommentNode>,
}

/// Loads every comment of a post with its author, in chronological order.
pub fn load_post_comments(conn: &mut PgConnection, post_id: i64) -> QueryResult<Vec<CommentRow>> {
    let rows = comments::table
        .filter(comments::post_id.eq(post_id))
        .order((comments::created_date.asc(), comments::id.asc()))
        .select(Comment::as_select())
        .load::<Comment>(conn)?;

    let author_ids: Vec<i64> = rows.iter().map(|c| c.user_id).collect();
    let authors = user_service::summaries_by_id(conn, &author_ids)?;

    Ok(rows
        .into_iter()
        .filter_map(|comment| match authors.get(&comment.user_id) {
            Some(user) => Some(CommentRow { comment, user: user.clone() }),
            None => {
                tracing::warn!(comment_id = comment.id, user_id = comment.user_id, "comment author missing");
                None
            }
        })
        .collect())
}

/// Loads the comments of a post and builds its full tree, with like counts.
pub fn post_comment_tree(conn: &mut PgConnection, post_id: i64, max_depth: usize) -> QueryResult<Vec<CommentNode>> {
    let rows = load_post_comments(conn, post_id)?;
    let ids: Vec<i64> = rows.iter().map(|r| r.comment.id).collect();
    let likes = counters::comment_likes_counts(conn, &ids)?;
    Ok(build_tree(rows, &likes, max_depth))
}

/// Builds the forest of a post's comments.
///
/// A comment whose parent is not among `rows` is treated as top-level.
pub fn build_tree(rows: Vec<CommentRow>, likes: &HashMap<i64, i64>, max_depth: usize) -> Vec<CommentNode> {
    let arena = Arena::new(rows);
    let mut roots = arena.roots.clone();
    // Stable: equal timestamps stay in ascending id order.
    roots.sort_by(|a, b| arena.rows[*b].comment.created_date.cmp(&arena.rows[*a].comment.created_date));
    arena.assemble(&roots, likes, max_depth)
}

/// Builds the tree rooted at `root_id`, or `None` if it is not in `rows`.
pub fn build_subtree(
    rows: Vec<CommentRow>,
    root_id: i64,
    likes: &HashMap<i64, i64>,
    max_depth: usize,
) -> Option<CommentNode> {
    let arena = Arena::new(rows);
    let root = *arena.index.get(&root_id)?;
    arena.assemble(&[root], likes, max_depth).pop()
}

struct Arena {
    /// Chronological, so index order is reply order.
    rows: Vec<CommentRow>,
    index: HashMap<i64, usize>,
    children: Vec<Vec<usize>>,
    roots: Vec<usize>,
}

impl Arena {
    fn new(mut rows: Vec<CommentRow>) -> Self {
        rows.sort_by(|a, b| {
            (a.comment.created_date, a.comment.id).cmp(&(b.comment.created_date, b.comment.id))
        });

        let index: HashMap<i64, usize> = rows
            .iter()
            .enumerate()
            .map(|(i, r)| (r.comment.id, i))
            .collect();

        let mut children = vec![Vec::new(); rows.len()];
        let mut roots = Vec::new();
        for (i, row) in rows.iter().enumerate() {
            match row.comment.parent_id.and_then(|p| index.get(&p)) {
                Some(&parent) if parent != i => children[parent].push(i),
                _ => roots.push(i),
            }
        }

        Self { rows, index, children, roots }
    }

    /// Nests `roots` and their descendants. Rows unreachable from `roots`
    /// are left out.
    fn assemble(&self, roots: &[usize], likes: &HashMap<i64, i64>, max_depth: usize) -> Vec<CommentNode> {
        let max_depth = max_depth.max(1);
        let n = self.rows.len();
        let mut visited = vec![false; n];
        let mut nested: Vec<Vec<usize>> = vec![Vec::new(); n];

        // Pass 1: decide each node's output parent, hoisting below the ceiling.
        let mut pending: Vec<(usize, usize)> = Vec::with_capacity(roots.len());
        for &r in roots {
            if !visited[r] {
                visited[r] = true;
                pending.push((r, 1));
            }
        }
        while let Some((idx, depth)) = pending.pop() {
            if depth < max_depth {
                for &c in &self.children[idx] {
                    if !visited[c] {
                        visited[c] = true;
                        nested[idx].push(c);
                        pending.push((c, depth + 1));
                    }
                }
            } else {
                let mut flat = Vec::new();
                let mut descendants: Vec<usize> = self.children[idx].clone();
                while let Some(c) = descendants.pop() {
                    if visited[c] {
                        continue;
                    }
                    visited[c] = true;
                    flat.push(c);
                    descendants.extend_from_slice(&self.children[c]);
                }
                flat.sort_unstable();
                nested[idx] = flat;
            }
        }

        // Pass 2: post-order build so every child exists before its parent.
        let mut built: Vec<Option<CommentNode>> = (0..n).map(|_| None).collect();
        let mut stack: Vec<(usize, bool)> = roots.iter().rev().map(|&r| (r, false)).collect();
        while let Some((idx, expanded)) = stack.pop() {
            if expanded {
                let subcomments = nested[idx].iter().filter_map(|&c| built[c].take()).collect();
                built[idx] = Some(self.node(idx, likes, subcomments));
            } else {
                stack.push((idx, true));
                stack.extend(nested[idx].iter().rev().map(|&c| (c, false)));
            }
        }

        roots.iter().filter_map(|&r| built[r].take()).collect()
    }

    fn node(&self, idx: usize, likes: &HashMap<i64, i64>, subcomments: Vec<CommentNode>) -> CommentNode {
        let row = &self.rows[idx];
        CommentNode {
            id: row.comment.id,
            user: row.user.clone(),
            text: row.comment.text.clone(),
            parent: row.comment.parent_id,
            created_date: row.comment.created_date,
            likes_count: likes.get(&row.comment.id).copied().unwrap_or(0),
            subcomments,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn author() -> UserSummary {
        UserSummary {
            id: 1,
            username: "ada".into(),
            first_name: Some("Ada".into()),
            last_name: Some("Lovelace".into()),
            user_image: None,
            is_official: false,
        }
    }

    fn row(id: i64, parent: Option<i64>, minute: u32) -> CommentRow {
        CommentRow {
            comment: Comment {
                id,
                post_id: 1,
                user_id: 1,
                text: Some(format!("comment {id}")),
                parent_id: parent,
                created_date: Utc.with_ymd_and_hms(2024, 6, 1, 12, minute, 0).unwrap(),
            },
            user: author(),
        }
    }

    fn ids(nodes: &[CommentNode]) -> Vec<i64> {
        nodes.iter().map(|n| n.id).collect()
    }

    fn count_nodes(nodes: &[CommentNode]) -> usize {
        let mut total = 0;
        let mut stack: Vec<&CommentNode> = nodes.iter().collect();
        while let Some(node) = stack.pop() {
            total += 1;
            stack.extend(node.subcomments.iter());
        }
        total
    }

    fn max_nesting(nodes: &[CommentNode]) -> usize {
        let mut deepest = 0;
        let mut stack: Vec<(&CommentNode, usize)> = nodes.iter().map(|n| (n, 1)).collect();
        while let Some((node, depth)) = stack.pop() {
            deepest = deepest.max(depth);
            stack.extend(node.subcomments.iter().map(|c| (c, depth + 1)));
        }
        deepest
    }

    #[test]
    fn newest_top_level_first_with_nested_reply() {
        // C1 first, C2 second, C3 replies to C1.
        let rows = vec![row(1, None, 0), row(2, None, 1), row(3, Some(1), 2)];
        let tree = build_tree(rows, &HashMap::new(), 64);

        assert_eq!(ids(&tree), vec![2, 1]);
        assert!(tree[0].subcomments.is_empty());
        assert_eq!(ids(&tree[1].subcomments), vec![3]);
        assert_eq!(tree[1].subcomments[0].parent, Some(1));
    }

    #[test]
    fn input_order_does_not_matter() {
        let rows = vec![row(3, Some(1), 2), row(2, None, 1), row(1, None, 0)];
        let tree = build_tree(rows, &HashMap::new(), 64);
        assert_eq!(ids(&tree), vec![2, 1]);
        assert_eq!(ids(&tree[1].subcomments), vec![3]);
    }

    #[test]
    fn timestamp_ties_keep_insertion_order() {
        let rows = vec![row(5, None, 0), row(4, None, 0), row(6, None, 0), row(7, None, 1)];
        let tree = build_tree(rows, &HashMap::new(), 64);
        assert_eq!(ids(&tree), vec![7, 4, 5, 6]);
    }

    #[test]
    fn replies_are_chronological() {
        let rows = vec![row(1, None, 0), row(2, Some(1), 3), row(3, Some(1), 1), row(4, Some(1), 2)];
        let tree = build_tree(rows, &HashMap::new(), 64);
        assert_eq!(ids(&tree[0].subcomments), vec![3, 4, 2]);
    }

    #[test]
    fn like_counts_annotate_every_level() {
        let rows = vec![row(1, None, 0), row(2, Some(1), 1), row(3, Some(2), 2)];
        let likes = HashMap::from([(1, 4), (3, 1)]);
        let tree = build_tree(rows, &likes, 64);

        assert_eq!(tree[0].likes_count, 4);
        assert_eq!(tree[0].subcomments[0].likes_count, 0);
        assert_eq!(tree[0].subcomments[0].subcomments[0].likes_count, 1);
    }

    #[test]
    fn every_comment_appears_once() {
        let mut rows = Vec::new();
        for id in 1..=40 {
            let parent = if id % 4 == 1 { None } else { Some(id - 1 - (id % 3)) };
            rows.push(row(id, parent.filter(|p| *p >= 1), (id % 60) as u32));
        }
        let tree = build_tree(rows, &HashMap::new(), 64);
        assert_eq!(count_nodes(&tree), 40);
    }

    #[test]
    fn orphaned_reply_becomes_top_level() {
        let rows = vec![row(1, None, 0), row(2, Some(99), 1)];
        let tree = build_tree(rows, &HashMap::new(), 64);
        assert_eq!(ids(&tree), vec![2, 1]);
    }

    #[test]
    fn deep_chain_is_capped_and_hoisted() {
        // A single reply chain 1 <- 2 <- 3 <- ... <- 10_000.
        let rows: Vec<CommentRow> = (1..=10_000)
            .map(|id| {
                let mut r = row(id, if id == 1 { None } else { Some(id - 1) }, 0);
                r.comment.created_date += chrono::Duration::seconds(id);
                r
            })
            .collect();
        let tree = build_tree(rows, &HashMap::new(), 8);

        assert_eq!(max_nesting(&tree), 9);
        assert_eq!(count_nodes(&tree), 10_000);

        let mut node = &tree[0];
        for _ in 1..8 {
            node = &node.subcomments[0];
        }
        assert_eq!(node.id, 8);
        assert_eq!(node.subcomments.len(), 10_000 - 8);
        assert_eq!(node.subcomments.first().map(|n| n.id), Some(9));
        assert_eq!(node.subcomments.last().map(|n| n.id), Some(10_000));
    }

    #[test]
    fn subtree_starts_at_requested_comment() {
        let rows = vec![row(1, None, 0), row(2, Some(1), 1), row(3, Some(2), 2), row(4, None, 3)];
        let sub = build_subtree(rows, 2, &HashMap::new(), 64).unwrap();
        assert_eq!(sub.id, 2);
        assert_eq!(ids(&sub.subcomments), vec![3]);
    }

    #[test]
    fn subtree_of_unknown_comment_is_none() {
        let rows = vec![row(1, None, 0)];
        assert!(build_subtree(rows, 42, &HashMap::new(), 64).is_none());
    }

    #[test]
    fn empty_post_has_empty_tree() {
        assert!(build_tree(Vec::new(), &HashMap::new(), 64).is_empty());
    }
}
