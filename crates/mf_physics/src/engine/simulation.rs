// crates/mf_physics/src/engine/simulation.rs

//! 投影法编排器
//!
//! 每步严格按以下顺序执行，步内不可中断：
//!
//! 1. `pre = apply_pre(fields_n)`
//! 2. `U* = predict(pre)`
//! 3. `b = build_rhs(U*)`
//! 4. `(P, meta) = solve_ppe(b)`
//! 5. `U = correct(U*, P)`，随后检查 NaN/Inf
//! 6. `fields_{n+1} = apply_post(U, P)`
//! 7. `health = measure(fields_{n+1}, meta)`
//! 8. `history.push(record)`
//! 9. `time += Δt; iteration += 1`
//!
//! 步与步之间检查状态不变量；外部取消（如步数上限）只在步间生效。
//!
//! # 使用示例
//!
//! ```
//! use mf_config::SimulationConfig;
//! use mf_physics::Simulation;
//!
//! let mut sim = Simulation::new(&SimulationConfig::cube(2)).unwrap();
//! let summary = sim.run_to_end(|_, _| Ok(())).unwrap();
//! assert_eq!(summary.steps, 10);
//! ```

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::boundary::BoundaryEngine;
use crate::engine::corrector::correct;
use crate::engine::diagnostics::{Health, History, StepRecord};
use crate::engine::ppe::{build_rhs, PpeSolver};
use crate::engine::predictor::predict;
use crate::fields::{allocate_fields, VelocityField};
use crate::grid::Grid;
use crate::mask::Mask;
use crate::numerics::linear_algebra::SolverConfig;
use crate::operators::Operators;
use crate::state::{Constants, Lifecycle, SolverState};
use mf_config::SimulationConfig;
use mf_foundation::{MfError, MfResult};

/// 一次运行的汇总
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RunSummary {
    /// 本次调用推进的步数
    pub steps: usize,
    /// 结束时间
    pub final_time: f64,
    /// 结束时的生命周期
    pub lifecycle: Lifecycle,
    /// PPE 未收敛的步数
    pub non_converged_steps: usize,
}

/// 模拟编排器
#[derive(Debug)]
pub struct Simulation {
    state: SolverState,
}

impl Simulation {
    /// 由已校验的配置初始化
    ///
    /// 依次经过 `Initialized -> OperatorsBuilt -> Ready`。
    pub fn new(config: &SimulationConfig) -> MfResult<Self> {
        config.validate()?;

        let grid = Grid::from_domain(&config.domain)?;
        let mask = Mask::ingest(&config.geometry.mask_flat, &config.geometry.mask_shape, &grid)?;
        let bcs = config.boundary_table()?;
        let params = &config.simulation_parameters;
        let constants = Constants::new(
            config.fluid_properties.density,
            config.fluid_properties.viscosity,
            params.time_step,
            &grid,
            config.body_force(),
        );
        let solver_config = SolverConfig {
            rtol: params.ppe_tolerance,
            atol: params.ppe_absolute_tolerance,
            max_iter: params.ppe_max_iterations,
            verbose: params.verbose_solver,
        };
        let mut lifecycle = Lifecycle::Initialized;
        info!(
            "{}: 网格 {}x{}x{}, 流体单元 {}, 固体单元 {}",
            lifecycle,
            grid.nx(),
            grid.ny(),
            grid.nz(),
            mask.fluid_count(),
            mask.solid_count()
        );

        let operators = Operators::build(&grid, &mask, &bcs, params.advection_scheme);
        lifecycle = enter(lifecycle, Lifecycle::OperatorsBuilt, 0);
        info!(
            "{}: nnz={}, PPE 奇异={}",
            lifecycle,
            operators.total_nnz(),
            operators.is_singular
        );

        let mut fields = allocate_fields(&grid, &mask);
        fields.apply_initial(
            config.initial_velocity(),
            config.initial_conditions.pressure,
            &operators.faces,
        );
        let boundary = BoundaryEngine::new(bcs, &operators.faces);
        let ppe = PpeSolver::new(solver_config, &operators.pressure, operators.is_singular);
        lifecycle = enter(lifecycle, Lifecycle::Ready, 0);

        let state = SolverState {
            intermediate: VelocityField::zeros(&grid),
            grid,
            mask,
            fields,
            constants,
            operators,
            boundary,
            ppe,
            pressure_halo: None,
            health: Health::default(),
            history: History::default(),
            iteration: 0,
            time: 0.0,
            total_time: params.total_time,
            lifecycle,
        };
        info!("{}: 总时间 {}, Δt {}", lifecycle, state.total_time, state.constants.dt);

        Ok(Self { state })
    }

    /// 求解器状态
    #[inline]
    pub fn state(&self) -> &SolverState {
        &self.state
    }

    /// 求解器状态（可变，用于测试与外部工具）
    #[inline]
    pub fn state_mut(&mut self) -> &mut SolverState {
        &mut self.state
    }

    /// 取出求解器状态
    pub fn into_state(self) -> SolverState {
        self.state
    }

    /// 当前生命周期
    #[inline]
    pub fn lifecycle(&self) -> Lifecycle {
        self.state.lifecycle
    }

    fn transition(&mut self, next: Lifecycle) {
        if self.state.lifecycle != next {
            self.state.lifecycle = enter(self.state.lifecycle, next, self.state.iteration);
        }
    }

    fn fail(&mut self, err: MfError) -> MfError {
        self.transition(Lifecycle::Failed);
        err
    }

    /// 推进一步
    pub fn step(&mut self) -> MfResult<StepRecord> {
        if !self.state.lifecycle.can_step() {
            return Err(MfError::invariant(
                "lifecycle",
                format!("状态 {} 下不能推进", self.state.lifecycle),
            ));
        }
        if let Err(err) = self.state.check_invariants() {
            return Err(self.fail(err));
        }
        self.transition(Lifecycle::Stepping);

        let state = &mut self.state;

        // 1. 预测前边界
        let pre = state
            .boundary
            .apply_pre(&state.grid, &state.operators.faces, &state.fields.vel);

        // 2. 预测
        let u_star = match predict(state, &pre) {
            Ok(v) => v,
            Err(err) => return Err(self.fail(err)),
        };

        // 3-4. 压力泊松方程
        let b = build_rhs(state, &u_star);
        let mut p = std::mem::take(&mut state.fields.p);
        let report = state.ppe.solve(&state.operators.pressure, &state.mask, &b, &mut p);

        // 5. 校正
        let mut vel = correct(state, &u_star, &p);
        let next_time = state.time + state.constants.dt;
        let non_finite = p
            .iter()
            .position(|v| !v.is_finite())
            .map(|idx| ("P", idx, p[idx]))
            .or_else(|| vel.first_non_finite());
        if let Some((field, index, value)) = non_finite {
            state.fields.p = p;
            return Err(self.fail(MfError::numeric(field, index, value, next_time)));
        }

        // 6. 校正后边界
        state.pressure_halo =
            state.boundary.apply_post(&state.grid, &state.operators.faces, &mut vel, &p);
        state.fields.vel = vel;
        state.fields.p = p;
        state.intermediate = u_star;

        // 7-8. 诊断
        state.health = Health::measure(
            &state.grid,
            &state.mask,
            &state.operators,
            &state.constants,
            &state.fields.vel,
            &report,
        );
        let record = StepRecord::new(next_time, state.iteration + 1, &state.health);
        state.history.push(&record);

        // 9. 时间推进
        state.time = next_time;
        state.iteration += 1;
        debug!(
            "步 {}: t={:.6}, div={:.3e}, max|u|={:.4}, cfl={:.4}, ppe_iter={}",
            record.step_index,
            record.time,
            record.divergence_norm,
            record.max_velocity,
            record.cfl,
            record.ppe_iterations
        );

        if let Err(err) = self.state.check_invariants() {
            return Err(self.fail(err));
        }
        if self.state.reached_end() {
            self.transition(Lifecycle::Terminated);
        }
        Ok(record)
    }

    /// 推进至总时间，或至多 `max_steps` 步
    ///
    /// 每步后调用 `observer`；观察者返回错误时立即停止。
    pub fn run<F>(&mut self, max_steps: Option<usize>, mut observer: F) -> MfResult<RunSummary>
    where
        F: FnMut(&SolverState, &StepRecord) -> MfResult<()>,
    {
        let mut steps = 0;
        let mut non_converged_steps = 0;

        while self.state.lifecycle.can_step() && !self.state.reached_end() {
            if max_steps.map_or(false, |n| steps >= n) {
                break;
            }
            let record = self.step()?;
            steps += 1;
            if !record.ppe_converged {
                non_converged_steps += 1;
            }
            observer(&self.state, &record)?;
        }
        if self.state.lifecycle.can_step() && self.state.reached_end() {
            self.transition(Lifecycle::Terminated);
        }

        Ok(RunSummary {
            steps,
            final_time: self.state.time,
            lifecycle: self.state.lifecycle,
            non_converged_steps,
        })
    }

    /// 推进至总时间
    pub fn run_to_end<F>(&mut self, observer: F) -> MfResult<RunSummary>
    where
        F: FnMut(&SolverState, &StepRecord) -> MfResult<()>,
    {
        self.run(None, observer)
    }
}

fn enter(from: Lifecycle, next: Lifecycle, iteration: usize) -> Lifecycle {
    debug_assert!(from.can_transition_to(next), "{} -> {}", from, next);
    info!("生命周期 {} -> {} (步 {})", from, next, iteration);
    next
}
