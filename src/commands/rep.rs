use crate::args::Args;
use crate::binio::read_record;
use crate::commands::open_mounted;
use crate::context::Context;
use crate::error::{CommandError, FsError};
use crate::fs::Ext2Like;
use crate::mbr::Mbr;
use crate::report;
use std::fs;

pub fn run(ctx: &mut Context, raw_args: &str) -> Result<String, CommandError> {
    run_inner(ctx, raw_args).map_err(|e| CommandError::new("Reporte no generado.", e))
}

fn run_inner(ctx: &mut Context, raw_args: &str) -> Result<String, FsError> {
    let args = Args::parse(raw_args);
    let id = args.require("id")?;
    let out_path = args.require("path")?;
    let name = args.require("name")?;
    let target = args.get("path_file_ls");

    let mount = ctx.registry.get(id)?.clone();

    let dot = match name {
        "mbr" => {
            let mut disk_file = fs::OpenOptions::new().read(true).open(&mount.disk_path)?;
            let mbr: Mbr = read_record(&mut disk_file, 0)?;
            report::dot_mbr(&mbr)
        }
        "disk" => {
            let mut disk_file = fs::OpenOptions::new().read(true).open(&mount.disk_path)?;
            let mbr: Mbr = read_record(&mut disk_file, 0)?;
            report::dot_disk(&mbr)
        }
        "sb" => {
            let (_file, sb, _start) = open_mounted(ctx, id)?;
            report::dot_superblock(&sb)
        }
        "bm_inode" => {
            let (mut file, sb, start) = open_mounted(ctx, id)?;
            let bitmap = sb.read_inode_bitmap(&mut file, start)?;
            report::dot_bitmap("bm_inode", &bitmap)
        }
        "bm_block" => {
            let (mut file, sb, start) = open_mounted(ctx, id)?;
            let bitmap = sb.read_block_bitmap(&mut file, start)?;
            report::dot_bitmap("bm_block", &bitmap)
        }
        "inode" => {
            let index: i32 = target
                .ok_or_else(|| FsError::argument("inode report requires -path_file_ls"))?
                .parse()
                .map_err(|_| FsError::argument("invalid inode index"))?;
            let (mut file, sb, start) = open_mounted(ctx, id)?;
            let mut service = Ext2Like::new(&mut file, sb, start);
            let inode = service.read_inode_pub(index)?;
            report::dot_inode(index, &inode)
        }
        "block" => {
            let index: i32 = target
                .ok_or_else(|| FsError::argument("block report requires -path_file_ls"))?
                .parse()
                .map_err(|_| FsError::argument("invalid block index"))?;
            let (mut file, sb, start) = open_mounted(ctx, id)?;
            let off = sb.block_offset(start, index);
            let bytes = crate::binio::read_bytes(&mut file, off, sb.block_size as usize)?;
            report::dot_block(index, &bytes)
        }
        "file" => {
            let path = target.ok_or_else(|| FsError::argument("file report requires -path_file_ls"))?;
            let (mut file, sb, start) = open_mounted(ctx, id)?;
            let mut service = Ext2Like::new(&mut file, sb, start);
            let (inode, _) = service.get_inode_by_path(path)?;
            let content = service.read_file_content(&inode)?;
            report::dot_file(path, &String::from_utf8_lossy(&content))
        }
        "ls" => {
            let path = target.unwrap_or("/");
            let (mut file, sb, start) = open_mounted(ctx, id)?;
            let mut service = Ext2Like::new(&mut file, sb, start);
            let (dir, _) = service.get_inode_by_path(path)?;
            let entries = service.list_dir_entries(&dir)?;
            report::dot_ls(&entries)
        }
        "tree" => {
            let path = target.unwrap_or("/");
            let (mut file, sb, start) = open_mounted(ctx, id)?;
            let mut service = Ext2Like::new(&mut file, sb, start);
            let (_, dir_idx) = service.get_inode_by_path(path)?;
            let mut edges = Vec::new();
            report::collect_tree(&mut service, path, dir_idx, &mut edges)?;
            report::dot_tree(&edges)
        }
        other => return Err(FsError::argument(format!("unknown report type: {other}"))),
    };

    let ext = report::extension_of(out_path)?;
    let dot_path = format!("{}.dot", out_path.trim_end_matches(&format!(".{ext}")));
    fs::write(&dot_path, &dot)?;
    report::render(&dot_path, out_path, &ext)?;

    tracing::info!(id, name, out_path, "generated report");
    Ok(format!("Reporte {name} generado en {out_path}."))
}
