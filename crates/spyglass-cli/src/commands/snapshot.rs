//! Managed-collection snapshot command.

use std::fmt::Display;
use std::path::Path;

use anyhow::{Context, Result};
use spyglass::snapshot::CollectionKind;
use spyglass::{
    ArraySnapshot, DictSnapshot, HashSetSnapshot, ListSnapshot, MemoryDump, Scalar, ScalarKind,
    layout,
};

pub struct SnapshotArgs {
    pub kind: CollectionKind,
    pub address: u64,
    pub elem: ScalarKind,
    pub key: ScalarKind,
    pub limit: Option<usize>,
}

/// Monomorphize `$print` for the element type named on the command line.
macro_rules! dispatch_elem {
    ($print:ident, $dump:expr, $addr:expr, $limit:expr, $elem:expr) => {
        match $elem {
            ScalarKind::U8 => $print::<u8>($dump, $addr, $limit),
            ScalarKind::I8 => $print::<i8>($dump, $addr, $limit),
            ScalarKind::U16 => $print::<u16>($dump, $addr, $limit),
            ScalarKind::I16 => $print::<i16>($dump, $addr, $limit),
            ScalarKind::U32 => $print::<u32>($dump, $addr, $limit),
            ScalarKind::I32 => $print::<i32>($dump, $addr, $limit),
            ScalarKind::U64 => $print::<u64>($dump, $addr, $limit),
            ScalarKind::I64 => $print::<i64>($dump, $addr, $limit),
            ScalarKind::F32 => $print::<f32>($dump, $addr, $limit),
            ScalarKind::F64 => $print::<f64>($dump, $addr, $limit),
        }
    };
}

pub fn run(dump_path: &Path, args: &SnapshotArgs) -> Result<()> {
    let dump = MemoryDump::load(dump_path)
        .with_context(|| format!("failed to load dump {}", dump_path.display()))?;
    let limit = args.limit.unwrap_or(layout::MAX_ELEMENTS);
    let address = args.address;

    match args.kind {
        CollectionKind::Array => dispatch_elem!(print_array, &dump, address, limit, args.elem),
        CollectionKind::List => dispatch_elem!(print_list, &dump, address, limit, args.elem),
        CollectionKind::Set => dispatch_elem!(print_set, &dump, address, limit, args.elem),
        CollectionKind::Dict => match args.key {
            ScalarKind::I32 => dispatch_dict_value::<i32>(&dump, args, limit),
            ScalarKind::U32 => dispatch_dict_value::<u32>(&dump, args, limit),
            ScalarKind::U64 => dispatch_dict_value::<u64>(&dump, args, limit),
            ScalarKind::I64 => dispatch_dict_value::<i64>(&dump, args, limit),
            other => anyhow::bail!("unsupported dictionary key type '{}'", other),
        },
    }
}

fn print_array<T: Scalar + Display>(dump: &MemoryDump, address: u64, limit: usize) -> Result<()> {
    let mut snap = ArraySnapshot::<T>::new();
    snap.capture_bounded(dump, address, true, limit)
        .context("array capture failed")?;
    println!("array[{}] at {:#x}:", snap.len(), address);
    for (i, value) in snap.iter().enumerate() {
        println!("  [{}] {}", i, value);
    }
    Ok(())
}

fn print_list<T: Scalar + Display>(dump: &MemoryDump, address: u64, limit: usize) -> Result<()> {
    let mut snap = ListSnapshot::<T>::new();
    snap.capture_bounded(dump, address, true, limit)
        .context("list capture failed")?;
    println!("list[{}] at {:#x}:", snap.len(), address);
    for (i, value) in snap.iter().enumerate() {
        println!("  [{}] {}", i, value);
    }
    Ok(())
}

fn print_set<T: Scalar + Display>(dump: &MemoryDump, address: u64, limit: usize) -> Result<()> {
    let mut snap = HashSetSnapshot::<T>::new();
    snap.capture_bounded(dump, address, true, limit)
        .context("set capture failed")?;
    println!("set[{}] at {:#x}:", snap.len(), address);
    for value in snap.iter() {
        println!("  {}", value);
    }
    Ok(())
}

fn print_dict<K, V>(dump: &MemoryDump, address: u64, limit: usize) -> Result<()>
where
    K: Scalar + Display,
    V: Scalar + Display,
{
    let mut snap = DictSnapshot::<K, V>::new();
    snap.capture_bounded(dump, address, true, limit)
        .context("dict capture failed")?;
    println!("dict[{}] at {:#x}:", snap.len(), address);
    for (key, value) in snap.iter() {
        println!("  {} => {}", key, value);
    }
    Ok(())
}

fn dispatch_dict_value<K: Scalar + Display>(
    dump: &MemoryDump,
    args: &SnapshotArgs,
    limit: usize,
) -> Result<()> {
    let address = args.address;
    match args.elem {
        ScalarKind::U8 => print_dict::<K, u8>(dump, address, limit),
        ScalarKind::I8 => print_dict::<K, i8>(dump, address, limit),
        ScalarKind::U16 => print_dict::<K, u16>(dump, address, limit),
        ScalarKind::I16 => print_dict::<K, i16>(dump, address, limit),
        ScalarKind::U32 => print_dict::<K, u32>(dump, address, limit),
        ScalarKind::I32 => print_dict::<K, i32>(dump, address, limit),
        ScalarKind::U64 => print_dict::<K, u64>(dump, address, limit),
        ScalarKind::I64 => print_dict::<K, i64>(dump, address, limit),
        ScalarKind::F32 => print_dict::<K, f32>(dump, address, limit),
        ScalarKind::F64 => print_dict::<K, f64>(dump, address, limit),
    }
}
