use crate::areas::repository::Repository;
use crate::artifacts::objects::object_id::ObjectId;
use std::io::Write;
use std::path::Path;

impl Repository {
    /// List a tree, or the tree of a commit. `recursive` descends into
    /// subtrees and lists files only.
    pub async fn ls_tree(&mut self, tree_ish: &str, recursive: bool) -> anyhow::Result<()> {
        let oid = self.resolve_object(tree_ish)?;
        let tree_oid = self.database().peel_to_tree(&oid)?;

        self.list_tree(&tree_oid, Path::new(""), recursive)
    }

    fn list_tree(&self, oid: &ObjectId, prefix: &Path, recursive: bool) -> anyhow::Result<()> {
        let tree = self.database().parse_tree(oid)?;

        for (name, entry) in tree.entries() {
            let path = prefix.join(name);

            if recursive && entry.is_tree() {
                self.list_tree(&entry.oid, &path, recursive)?;
                continue;
            }

            writeln!(
                self.writer(),
                "{:0>6} {} {}\t{}",
                entry.mode.as_str(),
                entry.object_type(),
                entry.oid,
                path.display()
            )?;
        }

        Ok(())
    }
}
