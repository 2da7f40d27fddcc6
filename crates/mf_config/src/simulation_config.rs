// crates/mf_config/src/simulation_config.rs

//! SimulationConfig - 模拟输入配置
//!
//! 与输入 JSON 一一对应的 serde 模型。必需键缺失时解析失败，
//! 可选的求解器参数通过 `#[serde(default = ...)]` 给出默认值。
//!
//! 语义校验分两种：
//! - [`SimulationConfig::validate`] 返回第一个违规
//! - [`SimulationConfig::validate_report`] 收集全部违规
//!
//! 掩码的长度、形状与取值属于几何校验，由物理层在导入掩码时完成。

use glam::DVec3;
use serde::{Deserialize, Serialize};
use std::path::Path;

use mf_foundation::validation::{ValidationError, ValidationReport, ValidationWarning};

use crate::boundary::{BoundaryRecord, BoundaryTable, Face};
use crate::error::ConfigError;

/// 唯一支持的扁平化约定
pub const FLATTENING_ORDER: &str = "i + nx*(j + ny*k)";

/// 模拟配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimulationConfig {
    /// 计算域
    pub domain: DomainConfig,
    /// 流体物性
    pub fluid_properties: FluidProperties,
    /// 时间推进与求解器参数
    pub simulation_parameters: SimulationParameters,
    /// 初始条件
    pub initial_conditions: InitialConditions,
    /// 障碍物掩码
    pub geometry: GeometryConfig,
    /// 体积力
    pub external_forces: ExternalForces,
    /// 边界条件记录（六个规范面各一条）
    pub boundary_conditions: Vec<BoundaryRecord>,
}

/// 计算域
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DomainConfig {
    /// x 下界
    pub x_min: f64,
    /// x 上界
    pub x_max: f64,
    /// y 下界
    pub y_min: f64,
    /// y 上界
    pub y_max: f64,
    /// z 下界
    pub z_min: f64,
    /// z 上界
    pub z_max: f64,
    /// x 方向单元数
    pub nx: usize,
    /// y 方向单元数
    pub ny: usize,
    /// z 方向单元数
    pub nz: usize,
}

impl DomainConfig {
    /// 单元数 (nx, ny, nz)
    pub fn counts(&self) -> [usize; 3] {
        [self.nx, self.ny, self.nz]
    }

    /// 各轴 (min, max)
    pub fn extents(&self) -> [(f64, f64); 3] {
        [
            (self.x_min, self.x_max),
            (self.y_min, self.y_max),
            (self.z_min, self.z_max),
        ]
    }

    /// 网格间距 (dx, dy, dz)，未校验
    pub fn spacing(&self) -> [f64; 3] {
        let c = self.counts();
        let e = self.extents();
        [0, 1, 2].map(|a| (e[a].1 - e[a].0) / c[a] as f64)
    }
}

/// 流体物性
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FluidProperties {
    /// 密度 ρ [kg/m³]
    pub density: f64,
    /// 动力黏度 μ [Pa·s]
    pub viscosity: f64,
}

/// 对流离散格式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum AdvectionScheme {
    /// 一阶迎风
    #[default]
    Upwind,
    /// 二阶中心差分
    Central,
}

/// 时间推进与求解器参数
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimulationParameters {
    /// 时间步长 Δt [s]
    pub time_step: f64,
    /// 总模拟时间 [s]
    pub total_time: f64,
    /// 输出间隔 [步]
    pub output_interval: usize,

    /// PPE 相对容差
    #[serde(default = "default_ppe_tolerance")]
    pub ppe_tolerance: f64,
    /// PPE 绝对容差
    #[serde(default = "default_ppe_absolute_tolerance")]
    pub ppe_absolute_tolerance: f64,
    /// PPE 最大迭代次数
    #[serde(default = "default_ppe_max_iterations")]
    pub ppe_max_iterations: usize,
    /// 对流格式
    #[serde(default)]
    pub advection_scheme: AdvectionScheme,
    /// 输出每次 PCG 迭代的残差
    #[serde(default)]
    pub verbose_solver: bool,
}

fn default_ppe_tolerance() -> f64 {
    1e-6
}

fn default_ppe_absolute_tolerance() -> f64 {
    1e-12
}

fn default_ppe_max_iterations() -> usize {
    1000
}

/// 初始条件
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InitialConditions {
    /// 初始速度 (u0, v0, w0)
    pub velocity: [f64; 3],
    /// 初始压力 p0
    pub pressure: f64,
}

/// 障碍物掩码
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeometryConfig {
    /// 扁平化掩码（1=流体, 0=固体, -1=边界流体）
    pub mask_flat: Vec<i32>,
    /// 掩码形状，应为 [nx, ny, nz]
    pub mask_shape: Vec<usize>,
    /// 扁平化约定
    #[serde(default = "default_flattening_order")]
    pub flattening_order: String,
}

fn default_flattening_order() -> String { FLATTENING_ORDER.to_string() }

/// 体积力
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExternalForces {
    /// 单位质量体积力 (fx, fy, fz)
    pub force_vector: [f64; 3],
}

impl SimulationConfig {
    // ========================================================================
    // 构造
    // ========================================================================

    /// 单位立方体 `[0,1]³` 上的 `nx×ny×nz` 全流体封闭盒
    ///
    /// ρ=1, μ=0.01, Δt=0.01, 总时间 0.1，六面无滑移，静止初值。
    pub fn unit_box(nx: usize, ny: usize, nz: usize) -> Self {
        Self {
            domain: DomainConfig {
                x_min: 0.0,
                x_max: 1.0,
                y_min: 0.0,
                y_max: 1.0,
                z_min: 0.0,
                z_max: 1.0,
                nx,
                ny,
                nz,
            },
            fluid_properties: FluidProperties {
                density: 1.0,
                viscosity: 0.01,
            },
            simulation_parameters: SimulationParameters {
                time_step: 0.01,
                total_time: 0.1,
                output_interval: 1,
                ppe_tolerance: default_ppe_tolerance(),
                ppe_absolute_tolerance: default_ppe_absolute_tolerance(),
                ppe_max_iterations: default_ppe_max_iterations(),
                advection_scheme: AdvectionScheme::default(),
                verbose_solver: false,
            },
            initial_conditions: InitialConditions {
                velocity: [0.0; 3],
                pressure: 0.0,
            },
            geometry: GeometryConfig {
                mask_flat: vec![1; nx * ny * nz],
                mask_shape: vec![nx, ny, nz],
                flattening_order: default_flattening_order(),
            },
            external_forces: ExternalForces {
                force_vector: [0.0; 3],
            },
            boundary_conditions: Face::ALL.iter().map(|&f| BoundaryRecord::no_slip(f)).collect(),
        }
    }

    /// `n×n×n` 单位立方体
    pub fn cube(n: usize) -> Self {
        Self::unit_box(n, n, n)
    }

    /// 替换某个面的边界记录
    pub fn with_boundary(mut self, record: BoundaryRecord) -> Self {
        self.boundary_conditions.retain(|r| r.face != record.face);
        self.boundary_conditions.push(record);
        self
    }

    /// 设置掩码
    pub fn with_mask(mut self, mask_flat: Vec<i32>) -> Self {
        self.geometry.mask_flat = mask_flat;
        self
    }

    /// 设置时间步长与总时间
    pub fn with_time(mut self, time_step: f64, total_time: f64) -> Self {
        self.simulation_parameters.time_step = time_step;
        self.simulation_parameters.total_time = total_time;
        self
    }

    /// 设置密度与黏度
    pub fn with_fluid(mut self, density: f64, viscosity: f64) -> Self {
        self.fluid_properties = FluidProperties { density, viscosity };
        self
    }

    /// 设置初始条件
    pub fn with_initial(mut self, velocity: [f64; 3], pressure: f64) -> Self {
        self.initial_conditions = InitialConditions { velocity, pressure };
        self
    }

    /// 设置体积力
    pub fn with_force(mut self, force: [f64; 3]) -> Self {
        self.external_forces.force_vector = force;
        self
    }

    /// 设置对流格式
    pub fn with_advection(mut self, scheme: AdvectionScheme) -> Self {
        self.simulation_parameters.advection_scheme = scheme;
        self
    }

    /// 设置 PPE 容差
    pub fn with_ppe_tolerance(mut self, rtol: f64, atol: f64) -> Self {
        self.simulation_parameters.ppe_tolerance = rtol;
        self.simulation_parameters.ppe_absolute_tolerance = atol;
        self
    }

    // ========================================================================
    // 读写
    // ========================================================================

    /// 从 JSON 字符串解析并校验
    pub fn from_json_str(content: &str) -> Result<Self, ConfigError> {
        let config: SimulationConfig = serde_json::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// 从文件加载并校验
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path.as_ref()).map_err(ConfigError::Io)?;
        Self::from_json_str(&content)
    }

    /// 从文件加载但不校验（供 `validate` 命令收集全部问题）
    pub fn from_file_unchecked<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path.as_ref()).map_err(ConfigError::Io)?;
        Ok(serde_json::from_str(&content)?)
    }

    /// 保存配置到文件
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<(), ConfigError> {
        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(path, content).map_err(ConfigError::Io)?;
        Ok(())
    }

    // ========================================================================
    // 派生量
    // ========================================================================

    /// 类型化边界表
    pub fn boundary_table(&self) -> Result<BoundaryTable, ConfigError> {
        BoundaryTable::from_records(&self.boundary_conditions)
    }

    /// 初始速度向量
    pub fn initial_velocity(&self) -> DVec3 {
        DVec3::from_array(self.initial_conditions.velocity)
    }

    /// 体积力向量
    pub fn body_force(&self) -> DVec3 {
        DVec3::from_array(self.external_forces.force_vector)
    }

    /// 运行总步数 `ceil(total_time / Δt)`
    pub fn step_count(&self) -> usize {
        let p = &self.simulation_parameters;
        (p.total_time / p.time_step - 1e-9).ceil().max(0.0) as usize
    }

    // ========================================================================
    // 校验
    // ========================================================================

    /// 验证配置有效性，返回第一个违规
    pub fn validate(&self) -> Result<(), ConfigError> {
        match self.violations().into_iter().next() {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    /// 收集全部违规
    pub fn validate_report(&self) -> ValidationReport {
        let mut report = ValidationReport::new();
        for err in self.violations() {
            report.add_error(match err {
                ConfigError::InvalidValue { key, value, reason } => ValidationError::InvalidField {
                    key,
                    reason: format!("{} ({})", reason, value),
                },
                ConfigError::Missing(key) => ValidationError::Missing { key },
                other => ValidationError::Custom {
                    message: other.to_string(),
                },
            });
        }

        let u0 = self.initial_velocity().length();
        let dt = self.simulation_parameters.time_step;
        let [dx, _, _] = self.domain.spacing();
        if u0 * dt > 0.5 * dx && u0 * dt <= dx {
            report.add_warning(ValidationWarning::HighValue {
                field: "initial CFL".into(),
                value: u0 * dt / dx,
                threshold: 0.5,
            });
        }
        report
    }

    fn violations(&self) -> Vec<ConfigError> {
        let mut out = Vec::new();

        // 计算域
        let d = &self.domain;
        let names = ["x", "y", "z"];
        let mut domain_ok = true;
        for (axis, (lo, hi)) in d.extents().into_iter().enumerate() {
            let n = names[axis];
            if !lo.is_finite() || !hi.is_finite() {
                out.push(ConfigError::invalid(
                    format!("domain.{}_min/{}_max", n, n),
                    format!("[{}, {}]", lo, hi),
                    "范围必须为有限值",
                ));
                domain_ok = false;
            } else if hi <= lo {
                out.push(ConfigError::invalid(
                    format!("domain.{}_max", n),
                    hi,
                    format!("必须大于 {}_min={}", n, lo),
                ));
                domain_ok = false;
            }
        }
        for (axis, count) in d.counts().into_iter().enumerate() {
            if count == 0 {
                out.push(ConfigError::invalid(
                    format!("domain.n{}", names[axis]),
                    count,
                    "必须为正整数",
                ));
                domain_ok = false;
            }
        }

        // 物性
        let fp = &self.fluid_properties;
        if !(fp.density.is_finite() && fp.density > 0.0) {
            out.push(ConfigError::invalid("fluid_properties.density", fp.density, "必须为正"));
        }
        if !(fp.viscosity.is_finite() && fp.viscosity >= 0.0) {
            out.push(ConfigError::invalid("fluid_properties.viscosity", fp.viscosity, "不能为负"));
        }

        // 时间推进
        let sp = &self.simulation_parameters;
        let dt_ok = sp.time_step.is_finite() && sp.time_step > 0.0;
        if !dt_ok {
            out.push(ConfigError::invalid(
                "simulation_parameters.time_step",
                sp.time_step,
                "必须为正",
            ));
        }
        if !(sp.total_time.is_finite() && sp.total_time > 0.0) {
            out.push(ConfigError::invalid(
                "simulation_parameters.total_time",
                sp.total_time,
                "必须为正",
            ));
        }
        if sp.output_interval < 1 {
            out.push(ConfigError::invalid(
                "simulation_parameters.output_interval",
                sp.output_interval,
                "必须 ≥ 1",
            ));
        }
        if !(sp.ppe_tolerance.is_finite() && sp.ppe_tolerance > 0.0) {
            out.push(ConfigError::invalid(
                "simulation_parameters.ppe_tolerance",
                sp.ppe_tolerance,
                "必须为正",
            ));
        }
        if !(sp.ppe_absolute_tolerance.is_finite() && sp.ppe_absolute_tolerance >= 0.0) {
            out.push(ConfigError::invalid(
                "simulation_parameters.ppe_absolute_tolerance",
                sp.ppe_absolute_tolerance,
                "不能为负",
            ));
        }
        if sp.ppe_max_iterations == 0 {
            out.push(ConfigError::invalid(
                "simulation_parameters.ppe_max_iterations",
                sp.ppe_max_iterations,
                "必须 ≥ 1",
            ));
        }

        // 初始条件与体积力
        let ic = &self.initial_conditions;
        let velocity_ok = ic.velocity.iter().all(|v| v.is_finite());
        if !velocity_ok {
            out.push(ConfigError::invalid(
                "initial_conditions.velocity",
                format!("{:?}", ic.velocity),
                "必须为有限值",
            ));
        }
        if !ic.pressure.is_finite() {
            out.push(ConfigError::invalid(
                "initial_conditions.pressure",
                ic.pressure,
                "必须为有限值",
            ));
        }
        let f = &self.external_forces.force_vector;
        if !f.iter().all(|v| v.is_finite()) {
            out.push(ConfigError::invalid(
                "external_forces.force_vector",
                format!("{:?}", f),
                "必须为有限值",
            ));
        }

        // 几何
        if self.geometry.flattening_order != FLATTENING_ORDER {
            out.push(ConfigError::invalid(
                "geometry.flattening_order",
                &self.geometry.flattening_order,
                format!("仅支持 \"{}\"", FLATTENING_ORDER),
            ));
        }

        // 边界
        if let Err(err) = self.boundary_table() {
            out.push(err);
        }

        // CFL 预检：‖u0‖·Δt ≤ dx
        if domain_ok && dt_ok && velocity_ok {
            let [dx, _, _] = d.spacing();
            let u0 = self.initial_velocity().length();
            if u0 * sp.time_step > dx {
                out.push(ConfigError::invalid(
                    "simulation_parameters.time_step",
                    sp.time_step,
                    format!("CFL 预检失败: ‖u0‖·Δt = {:.3e} > dx = {:.3e}", u0 * sp.time_step, dx),
                ));
            }
        }

        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cube_is_valid() {
        let config = SimulationConfig::cube(2);
        assert!(config.validate().is_ok());
        assert_eq!(config.domain.spacing(), [0.5, 0.5, 0.5]);
        assert_eq!(config.step_count(), 10);
    }

    #[test]
    fn test_defaults_applied() {
        let json = r#"{
            "domain": {"x_min":0,"x_max":1,"y_min":0,"y_max":1,"z_min":0,"z_max":1,"nx":1,"ny":1,"nz":1},
            "fluid_properties": {"density":1.0,"viscosity":0.0},
            "simulation_parameters": {"time_step":0.1,"total_time":1.0,"output_interval":1},
            "initial_conditions": {"velocity":[0,0,0],"pressure":0},
            "geometry": {"mask_flat":[1],"mask_shape":[1,1,1],"flattening_order":"i + nx*(j + ny*k)"},
            "external_forces": {"force_vector":[0,0,0]},
            "boundary_conditions": [
                {"face":"x_min","type":"no_slip"},
                {"face":"x_max","type":"no_slip"},
                {"face":"y_min","type":"no_slip"},
                {"face":"y_max","type":"no_slip"},
                {"face":"z_min","type":"no_slip"},
                {"face":"z_max","type":"no_slip"}
            ]
        }"#;
        let config = SimulationConfig::from_json_str(json).unwrap();
        let sp = &config.simulation_parameters;
        assert_eq!(sp.ppe_tolerance, 1e-6);
        assert_eq!(sp.ppe_absolute_tolerance, 1e-12);
        assert_eq!(sp.ppe_max_iterations, 1000);
        assert_eq!(sp.advection_scheme, AdvectionScheme::Upwind);
        assert!(!sp.verbose_solver);
    }

    #[test]
    fn test_missing_key_is_parse_error() {
        let err = SimulationConfig::from_json_str(r#"{"domain": {}}"#).unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn test_inverted_extent() {
        let mut config = SimulationConfig::cube(2);
        config.domain.x_max = -1.0;
        let err = config.validate().unwrap_err();
        assert_eq!(err.key(), Some("domain.x_max"));
    }

    #[test]
    fn test_non_positive_density() {
        let config = SimulationConfig::cube(2).with_fluid(0.0, 0.01);
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_cfl_precheck() {
        // dx = 0.5, Δt = 0.01：‖u0‖ ≤ 50 可通过
        let ok = SimulationConfig::cube(2).with_initial([30.0, 0.0, 40.0], 0.0);
        assert!(ok.validate().is_ok());

        let bad = SimulationConfig::cube(2).with_initial([60.0, 0.0, 0.0], 0.0);
        let err = bad.validate().unwrap_err();
        assert_eq!(err.key(), Some("simulation_parameters.time_step"));
    }

    #[test]
    fn test_flattening_order_must_match() {
        let mut config = SimulationConfig::cube(2);
        config.geometry.flattening_order = "k + nz*(j + ny*i)".into();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_report_collects_all() {
        let mut config = SimulationConfig::cube(2).with_fluid(-1.0, -1.0);
        config.simulation_parameters.output_interval = 0;
        let report = config.validate_report();
        assert_eq!(report.error_count(), 3);
    }

    #[test]
    fn test_with_boundary_replaces() {
        let config = SimulationConfig::cube(3)
            .with_boundary(BoundaryRecord::inflow(Face::XMin, [1.0, 0.0, 0.0]))
            .with_boundary(BoundaryRecord::pressure(Face::XMax, 0.0));
        assert_eq!(config.boundary_conditions.len(), 6);
        let table = config.boundary_table().unwrap();
        assert!(table.has_pressure_dirichlet());
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("case.json");
        let config = SimulationConfig::cube(3).with_advection(AdvectionScheme::Central);
        config.save_to_file(&path).unwrap();
        let loaded = SimulationConfig::from_file(&path).unwrap();
        assert_eq!(
            loaded.simulation_parameters.advection_scheme,
            AdvectionScheme::Central
        );
        assert_eq!(loaded.geometry.mask_flat.len(), 27);
    }
}
