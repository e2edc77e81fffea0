//! Graphviz DOT emission for the ten report kinds. The core only
//! produces DOT text; [`render`] invokes the external `dot` binary as
//! a subprocess boundary, the same shape the teacher uses for its own
//! `ioctl`/external-syscall boundaries.

use crate::error::FsError;
use crate::fs::Ext2Like;
use crate::inode::Inode;
use crate::mbr::Mbr;
use crate::superblock::SuperBlock;
use std::process::Command;

pub fn dot_mbr(mbr: &Mbr) -> String {
    let mut out = String::from(
        "digraph MBR {\n  node [shape=plaintext];\n  mbr [label=<\n  <table border=\"1\" cellborder=\"1\" cellspacing=\"0\">\n",
    );
    out.push_str(&format!(
        "    <tr><td colspan=\"2\">total_size: {}</td></tr>\n",
        mbr.total_size
    ));
    out.push_str(&format!(
        "    <tr><td colspan=\"2\">creation_time: {}</td></tr>\n",
        mbr.creation_time
    ));
    out.push_str(&format!(
        "    <tr><td colspan=\"2\">signature: {}</td></tr>\n",
        mbr.signature
    ));
    for (i, p) in mbr.partitions.iter().enumerate() {
        out.push_str(&format!(
            "    <tr><td>part {i}</td><td>{} start={} size={} id={}</td></tr>\n",
            p.name, p.start, p.size, p.id
        ));
    }
    out.push_str("  </table>>];\n}\n");
    out
}

pub fn dot_disk(mbr: &Mbr) -> String {
    let mut out = String::from("digraph Disk {\n  node [shape=record];\n  disk [label=\"");
    out.push_str(&format!("MBR ({} bytes)", mbr.total_size));
    for p in mbr.partitions.iter().filter(|p| !p.is_empty_slot()) {
        out.push_str(&format!(" | {} ({} bytes)", p.name, p.size));
    }
    out.push_str("\"];\n}\n");
    out
}

pub fn dot_superblock(sb: &SuperBlock) -> String {
    format!(
        "digraph SuperBlock {{\n  node [shape=plaintext];\n  sb [label=<\n  <table border=\"1\" cellborder=\"1\">\n    <tr><td>magic</td><td>{:#x}</td></tr>\n    <tr><td>inodes_count</td><td>{}</td></tr>\n    <tr><td>blocks_count</td><td>{}</td></tr>\n    <tr><td>free_inodes_count</td><td>{}</td></tr>\n    <tr><td>free_blocks_count</td><td>{}</td></tr>\n    <tr><td>mnt_count</td><td>{}</td></tr>\n  </table>>];\n}}\n",
        sb.magic, sb.inodes_count, sb.blocks_count, sb.free_inodes_count, sb.free_blocks_count, sb.mnt_count
    )
}

pub fn dot_inode(index: i32, inode: &Inode) -> String {
    let mut out = format!(
        "digraph Inode{index} {{\n  node [shape=plaintext];\n  inode [label=<\n  <table border=\"1\" cellborder=\"1\">\n    <tr><td>index</td><td>{index}</td></tr>\n    <tr><td>uid</td><td>{}</td></tr>\n    <tr><td>gid</td><td>{}</td></tr>\n    <tr><td>size</td><td>{}</td></tr>\n    <tr><td>type</td><td>{}</td></tr>\n",
        inode.uid, inode.gid, inode.size, inode.itype
    );
    for (i, p) in inode.pointers.iter().enumerate() {
        out.push_str(&format!("    <tr><td>p{i}</td><td>{p}</td></tr>\n"));
    }
    out.push_str("  </table>>];\n}\n");
    out
}

pub fn dot_block(index: i32, bytes: &[u8]) -> String {
    format!(
        "digraph Block{index} {{\n  node [shape=box];\n  b [label=\"block {index}: {} bytes\"];\n}}\n",
        bytes.len()
    )
}

pub fn dot_bitmap(name: &str, bitmap: &[u8]) -> String {
    let used = bitmap.iter().filter(|&&b| b == b'1').count();
    format!(
        "digraph {name} {{\n  node [shape=plaintext];\n  bm [label=\"{name}: {used}/{} used\"];\n}}\n",
        bitmap.len()
    )
}

pub fn dot_file(path: &str, content: &str) -> String {
    let escaped = content.replace('\\', "\\\\").replace('"', "\\\"").replace('\n', "\\n");
    format!("digraph File {{\n  node [shape=box];\n  f [label=\"{path}:\\n{escaped}\"];\n}}\n")
}

pub fn dot_ls(entries: &[(String, i32)]) -> String {
    let mut out = String::from(
        "digraph Ls {\n  node [shape=plaintext];\n  ls [label=<\n  <table border=\"1\" cellborder=\"1\">\n",
    );
    for (name, inode) in entries {
        out.push_str(&format!("    <tr><td>{name}</td><td>{inode}</td></tr>\n"));
    }
    out.push_str("  </table>>];\n}\n");
    out
}

pub fn dot_tree(edges: &[(String, String)]) -> String {
    let mut out = String::from("digraph Tree {\n  node [shape=box];\n");
    for (from, to) in edges {
        out.push_str(&format!("  \"{from}\" -> \"{to}\";\n"));
    }
    out.push_str("}\n");
    out
}

/// Recursively walks a directory subtree, collecting `(parent_label,
/// child_label)` edges for [`dot_tree`]. Skips `.`/`..` to avoid
/// re-visiting the current and parent directories.
pub fn collect_tree(
    service: &mut Ext2Like,
    label: &str,
    dir_index: i32,
    edges: &mut Vec<(String, String)>,
) -> Result<(), FsError> {
    let dir = service.read_inode_pub(dir_index)?;
    for (name, child_index) in service.list_dir_entries(&dir)? {
        if name == "." || name == ".." {
            continue;
        }
        let child_label = format!("{label}/{name}");
        edges.push((label.to_string(), child_label.clone()));
        let child = service.read_inode_pub(child_index)?;
        if child.is_dir() {
            collect_tree(service, &child_label, child_index, edges)?;
        }
    }
    Ok(())
}

/// Invokes the external `dot` renderer: `dot -T<ext> <dot_path> -o <out_path>`.
pub fn render(dot_path: &str, out_path: &str, ext: &str) -> Result<(), FsError> {
    let status = Command::new("dot")
        .arg(format!("-T{ext}"))
        .arg(dot_path)
        .arg("-o")
        .arg(out_path)
        .status()?;
    if !status.success() {
        return Err(FsError::state("dot renderer exited with a failure status"));
    }
    Ok(())
}

pub fn extension_of(path: &str) -> Result<String, FsError> {
    let ext = std::path::Path::new(path)
        .extension()
        .and_then(|e| e.to_str())
        .ok_or_else(|| FsError::argument("report path has no extension"))?;
    match ext.to_ascii_lowercase().as_str() {
        "png" | "svg" | "pdf" | "jpg" | "jpeg" => Ok(ext.to_ascii_lowercase()),
        other => Err(FsError::argument(format!("unsupported report extension: {other}"))),
    }
}
