// crates/mf_io/src/schema.rs

//! 状态视图的结构校验
//!
//! 在步边界对 [`StateView`](crate::StateView) 的 JSON 形式做结构检查，
//! 不依赖反序列化：
//!
//! - 必需键齐全、类型正确
//! - 三维数组的形状与 `grid.counts` 一致（面场沿自身方向多一层）
//! - 掩码取值属于 {-1, 0, 1}
//! - 稀疏描述符为 `{format: "csr", shape, nnz}` 且形状与网格一致
//! - `operators.advection` 为 null
//! - 历史各列等长
//!
//! [`schema_report`] 收集全部问题，[`validate_state_view`] 返回第一个。

use serde_json::Value;

use crate::error::{IoError, IoResult};
use mf_foundation::validation::{ValidationError, ValidationReport};

/// 顶层必需键
pub const REQUIRED_KEYS: [&str; 14] = [
    "grid",
    "mask",
    "fields",
    "intermediate",
    "constants",
    "operators",
    "boundary_conditions",
    "health",
    "history",
    "iteration",
    "time",
    "total_time",
    "lifecycle",
    "pressure_halo",
];

/// 历史列
pub const HISTORY_COLUMNS: [&str; 5] = [
    "time",
    "divergence_norm",
    "max_velocity",
    "ppe_iterations",
    "energy",
];

const LIFECYCLE_NAMES: [&str; 6] = [
    "Initialized",
    "OperatorsBuilt",
    "Ready",
    "Stepping",
    "Terminated",
    "Failed",
];

/// 校验状态视图，返回第一个结构错误
pub fn validate_state_view(value: &Value) -> IoResult<()> {
    let report = schema_report(value);
    match report.errors.first() {
        None => Ok(()),
        Some(err) => Err(IoError::schema(err.key().unwrap_or("$"), err.to_string())),
    }
}

/// 收集状态视图的全部结构问题
pub fn schema_report(value: &Value) -> ValidationReport {
    let mut report = ValidationReport::new();
    let Some(root) = value.as_object() else {
        invalid(&mut report, "$", "根节点必须是对象");
        return report;
    };

    for key in REQUIRED_KEYS {
        if !root.contains_key(key) {
            report.add_error(ValidationError::Missing { key: key.to_string() });
        }
    }
    if report.has_errors() {
        return report;
    }

    let counts = grid_counts(&mut report, &value["grid"]);

    if let Some(dims) = counts {
        check_array3(&mut report, "mask", &value["mask"], dims, Element::Mask);

        let face_dims = |axis: usize| {
            let mut d = dims;
            d[axis] += 1;
            d
        };
        check_array3(&mut report, "fields.p", &value["fields"]["p"], dims, Element::Number);
        for (axis, name) in ["u", "v", "w"].iter().enumerate() {
            check_array3(
                &mut report,
                &format!("fields.{}", name),
                &value["fields"][*name],
                face_dims(axis),
                Element::Number,
            );
            let star = format!("{}_star", name);
            check_array3(
                &mut report,
                &format!("intermediate.{}", star),
                &value["intermediate"][star.as_str()],
                face_dims(axis),
                Element::Number,
            );
        }

        check_operators(&mut report, &value["operators"], dims);

        match &value["pressure_halo"] {
            Value::Null => {}
            halo => check_array3(
                &mut report,
                "pressure_halo",
                halo,
                dims.map(|n| n + 2),
                Element::Number,
            ),
        }
    }

    check_constants(&mut report, &value["constants"]);
    check_boundaries(&mut report, &value["boundary_conditions"]);
    check_history(&mut report, &value["history"]);

    if !value["health"].is_object() {
        invalid(&mut report, "health", "必须是对象");
    }
    if value["iteration"].as_u64().is_none() {
        invalid(&mut report, "iteration", "必须是非负整数");
    }
    for key in ["time", "total_time"] {
        if value[key].as_f64().is_none() {
            invalid(&mut report, key, "必须是数值");
        }
    }
    match value["lifecycle"].as_str() {
        Some(name) if LIFECYCLE_NAMES.contains(&name) => {}
        _ => invalid(&mut report, "lifecycle", "未知的生命周期状态"),
    }

    report
}

// ============================================================
// 分项检查
// ============================================================

#[derive(Clone, Copy)]
enum Element {
    Number,
    Mask,
}

fn invalid(report: &mut ValidationReport, key: &str, reason: impl Into<String>) {
    report.add_error(ValidationError::InvalidField {
        key: key.to_string(),
        reason: reason.into(),
    });
}

fn grid_counts(report: &mut ValidationReport, grid: &Value) -> Option<[usize; 3]> {
    let counts = grid["counts"].as_array().and_then(|arr| {
        let v: Vec<usize> = arr
            .iter()
            .filter_map(Value::as_u64)
            .filter(|&n| n > 0)
            .map(|n| n as usize)
            .collect();
        (arr.len() == 3 && v.len() == 3).then(|| [v[0], v[1], v[2]])
    });
    if counts.is_none() {
        invalid(report, "grid.counts", "必须是三个正整数");
    }

    let spacing_ok = grid["spacing"]
        .as_array()
        .map_or(false, |arr| {
            arr.len() == 3 && arr.iter().all(|v| v.as_f64().map_or(false, |h| h > 0.0))
        });
    if !spacing_ok {
        invalid(report, "grid.spacing", "必须是三个正数");
    }
    counts
}

/// 检查三维嵌套数组，每个字段只报告第一个问题
fn check_array3(
    report: &mut ValidationReport,
    path: &str,
    value: &Value,
    dims: [usize; 3],
    element: Element,
) {
    let Some(planes) = value.as_array() else {
        invalid(report, path, "必须是三维数组");
        return;
    };
    if planes.len() != dims[0] {
        report.add_error(ValidationError::ShapeMismatch {
            field: path.to_string(),
            expected: dims[0],
            actual: planes.len(),
        });
        return;
    }
    for (i, plane) in planes.iter().enumerate() {
        let Some(rows) = plane.as_array().filter(|r| r.len() == dims[1]) else {
            invalid(report, &format!("{}[{}]", path, i), format!("期望长度 {} 的数组", dims[1]));
            return;
        };
        for (j, row) in rows.iter().enumerate() {
            let Some(cells) = row.as_array().filter(|c| c.len() == dims[2]) else {
                invalid(
                    report,
                    &format!("{}[{}][{}]", path, i, j),
                    format!("期望长度 {} 的数组", dims[2]),
                );
                return;
            };
            for (k, v) in cells.iter().enumerate() {
                let ok = match element {
                    Element::Number => v.as_f64().is_some(),
                    Element::Mask => v.as_i64().map_or(false, |m| (-1..=1).contains(&m)),
                };
                if !ok {
                    let reason = match element {
                        Element::Number => "期望数值".to_string(),
                        Element::Mask => format!("掩码取值 {} 不在 {{-1, 0, 1}} 中", v),
                    };
                    invalid(report, &format!("{}[{}][{}][{}]", path, i, j, k), reason);
                    return;
                }
            }
        }
    }
}

fn check_sparse(report: &mut ValidationReport, path: &str, value: &Value, shape: [usize; 2]) {
    if value["format"].as_str() != Some("csr") {
        invalid(report, &format!("{}.format", path), "必须为 \"csr\"");
    }
    let actual: Option<Vec<u64>> = value["shape"]
        .as_array()
        .map(|arr| arr.iter().filter_map(Value::as_u64).collect());
    match actual {
        Some(s) if s.len() == 2 && s[0] as usize == shape[0] && s[1] as usize == shape[1] => {}
        _ => invalid(
            report,
            &format!("{}.shape", path),
            format!("期望 [{}, {}]", shape[0], shape[1]),
        ),
    }
    match value["nnz"].as_u64() {
        Some(nnz) if nnz as usize <= shape[0] * shape[1] => {}
        _ => invalid(report, &format!("{}.nnz", path), "必须是不超过矩阵规模的非负整数"),
    }
}

fn check_operators(report: &mut ValidationReport, ops: &Value, dims: [usize; 3]) {
    if !ops.is_object() {
        invalid(report, "operators", "必须是对象");
        return;
    }
    let n_cells: usize = dims.iter().product();
    let n_faces = |axis: usize| {
        let mut d = dims;
        d[axis] += 1;
        d.iter().product::<usize>()
    };
    let n_dofs = n_faces(0) + n_faces(1) + n_faces(2);

    check_sparse(report, "operators.divergence", &ops["divergence"], [n_cells, n_dofs]);
    check_sparse(
        report,
        "operators.pressure_laplacian",
        &ops["pressure_laplacian"],
        [n_cells, n_cells],
    );
    for axis in 0..3 {
        let nf = n_faces(axis);
        check_sparse(
            report,
            &format!("operators.gradient[{}]", axis),
            &ops["gradient"][axis],
            [nf, n_cells],
        );
        check_sparse(
            report,
            &format!("operators.laplacian[{}]", axis),
            &ops["laplacian"][axis],
            [nf, nf],
        );
    }

    if !ops.get("advection").map_or(false, Value::is_null) {
        invalid(report, "operators.advection", "必须为 null");
    }
    if !ops["is_singular"].is_boolean() {
        invalid(report, "operators.is_singular", "必须是布尔值");
    }
}

fn check_constants(report: &mut ValidationReport, constants: &Value) {
    for key in ["density", "viscosity", "dt"] {
        if constants[key].as_f64().is_none() {
            invalid(report, &format!("constants.{}", key), "必须是数值");
        }
    }
    for key in ["spacing", "inv_spacing", "body_force"] {
        let ok = constants[key]
            .as_array()
            .map_or(false, |a| a.len() == 3 && a.iter().all(Value::is_number));
        if !ok {
            invalid(report, &format!("constants.{}", key), "必须是三个数值");
        }
    }
}

fn check_boundaries(report: &mut ValidationReport, records: &Value) {
    let Some(arr) = records.as_array() else {
        invalid(report, "boundary_conditions", "必须是数组");
        return;
    };
    if arr.len() != 6 {
        report.add_error(ValidationError::ShapeMismatch {
            field: "boundary_conditions".to_string(),
            expected: 6,
            actual: arr.len(),
        });
    }
    for (i, record) in arr.iter().enumerate() {
        for key in ["face", "type"] {
            if !record[key].is_string() {
                invalid(report, &format!("boundary_conditions[{}].{}", i, key), "必须是字符串");
            }
        }
    }
}

fn check_history(report: &mut ValidationReport, history: &Value) {
    let mut len = None;
    for col in HISTORY_COLUMNS {
        let path = format!("history.{}", col);
        let Some(arr) = history[col].as_array() else {
            invalid(report, &path, "必须是数组");
            continue;
        };
        if !arr.iter().all(Value::is_number) {
            invalid(report, &path, "元素必须是数值");
        }
        match len {
            None => len = Some(arr.len()),
            Some(n) if n != arr.len() => report.add_error(ValidationError::ShapeMismatch {
                field: path,
                expected: n,
                actual: arr.len(),
            }),
            Some(_) => {}
        }
    }
}
