//! 结构遍历：找出嵌套结构中的所有命令，并把结果写回同形的副本

use indexmap::IndexMap;

use crate::error::{BackendError, Error, Result};
use crate::value::{PathSegment, PendingCommand, Structure, Value};

pub fn is_command(structure: &Structure) -> bool {
    matches!(structure, Structure::Command(_))
}

/// 深度优先收集命令：序列按下标，映射按插入顺序
///
/// 根节点本身是命令，或者任何命令带有 iterate 标记时返回 Structure 错误。
pub fn find_commands(structure: &Structure) -> Result<Vec<PendingCommand>> {
    if is_command(structure) {
        return Err(Error::Structure(
            "a bare command must be resolved on its own, not as a structure".to_string(),
        ));
    }
    let mut pending = Vec::new();
    let mut path = Vec::new();
    collect(structure, &mut path, &mut pending)?;
    Ok(pending)
}

fn collect(
    structure: &Structure,
    path: &mut Vec<PathSegment>,
    pending: &mut Vec<PendingCommand>,
) -> Result<()> {
    match structure {
        Structure::Command(cmd) => {
            if cmd.is_iterate() {
                return Err(Error::Structure(format!(
                    "iterate command {} cannot be nested inside a structure",
                    cmd.opcode
                )));
            }
            pending.push(PendingCommand {
                path: path.clone(),
                command: cmd.clone(),
            });
        }
        Structure::Seq(items) => {
            for (i, item) in items.iter().enumerate() {
                path.push(PathSegment::Index(i));
                collect(item, path, pending)?;
                path.pop();
            }
        }
        Structure::Map(entries) => {
            for (k, item) in entries {
                path.push(PathSegment::Key(k.clone()));
                collect(item, path, pending)?;
                path.pop();
            }
        }
        Structure::Value(_) => {}
    }
    Ok(())
}

/// 深拷贝成 Value，命令位置替换为 Nil
pub fn clone_structure(structure: &Structure) -> Value {
    match structure {
        Structure::Command(_) => Value::Nil,
        Structure::Seq(items) => Value::List(items.iter().map(clone_structure).collect()),
        Structure::Map(entries) => Value::Map(
            entries
                .iter()
                .map(|(k, v)| (k.clone(), clone_structure(v)))
                .collect::<IndexMap<_, _>>(),
        ),
        Structure::Value(value) => value.clone(),
    }
}

/// 按发现顺序把结果写回副本中记录的路径
pub fn rehydrate(clone: &mut Value, pending: &[PendingCommand], results: Vec<Value>) -> Result<()> {
    if pending.len() != results.len() {
        return Err(BackendError::UnexpectedReply(format!(
            "expected {} results, got {}",
            pending.len(),
            results.len()
        ))
        .into());
    }
    for (cmd, result) in pending.iter().zip(results) {
        let slot = navigate(clone, &cmd.path).ok_or_else(|| {
            Error::Structure(format!("path {} not present in clone", render_path(&cmd.path)))
        })?;
        *slot = result;
    }
    Ok(())
}

fn navigate<'a>(mut node: &'a mut Value, path: &[PathSegment]) -> Option<&'a mut Value> {
    for segment in path {
        node = match (node, segment) {
            (Value::List(items), PathSegment::Index(i)) => items.get_mut(*i)?,
            (Value::Map(entries), PathSegment::Key(k)) => entries.get_mut(k)?,
            _ => return None,
        };
    }
    Some(node)
}

fn render_path(path: &[PathSegment]) -> String {
    path.iter().map(ToString::to_string).collect()
}
