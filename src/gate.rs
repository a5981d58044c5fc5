use crate::logic::GateLogic;
use crate::signal::{
    apply_noise, apply_propagation_delay, logical_to_volt, voltage_to_logical, NoiseSource,
    LOW_LEVEL_VOLT,
};
use crate::types::Volt;

/// A digital logic gate instance.
///
/// Binds one of the predefined [`GateLogic`]s to the per-instance simulation
/// state: input and output voltages, the logic levels of the previous tick,
/// and the propagation delay of its output filter. All buffers are sized by
/// the logic and start at 0 V / false.
#[derive(Debug, Clone)]
pub struct Gate {
    name: String,
    logic: GateLogic,
    propagation_delay: u32,
    inputs: Vec<Volt>,
    prev_inputs: Vec<Volt>,
    prev_inputs_logical: Vec<bool>,
    outputs: Vec<Volt>,
    prev_outputs: Vec<Volt>,
    prev_outputs_logical: Vec<bool>,
}

impl Gate {
    pub fn new(name: impl Into<String>, logic: GateLogic, propagation_delay: u32) -> Self {
        let n_in = logic.input_count();
        let n_out = logic.output_count();
        Gate {
            name: name.into(),
            logic,
            propagation_delay,
            inputs: vec![LOW_LEVEL_VOLT; n_in],
            prev_inputs: vec![LOW_LEVEL_VOLT; n_in],
            prev_inputs_logical: vec![false; n_in],
            outputs: vec![LOW_LEVEL_VOLT; n_out],
            prev_outputs: vec![LOW_LEVEL_VOLT; n_out],
            prev_outputs_logical: vec![false; n_out],
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn logic(&self) -> GateLogic {
        self.logic
    }

    pub fn logic_name(&self) -> &'static str {
        self.logic.name()
    }

    pub fn propagation_delay(&self) -> u32 {
        self.propagation_delay
    }

    pub fn input_count(&self) -> usize {
        self.inputs.len()
    }

    pub fn output_count(&self) -> usize {
        self.outputs.len()
    }

    /// Sets the voltage at input `index` for the next step.
    ///
    /// # Panics
    ///
    /// If `index` is not below [`Gate::input_count`].
    pub fn set_input(&mut self, index: usize, voltage: Volt) {
        self.inputs[index] = voltage;
    }

    /// Input voltages that will be read by the next step.
    pub fn inputs(&self) -> &[Volt] {
        &self.inputs
    }

    /// Output voltages committed by the most recent step.
    pub fn outputs(&self) -> &[Volt] {
        &self.outputs
    }

    pub fn output(&self, index: usize) -> Option<Volt> {
        self.outputs.get(index).copied()
    }

    /// Input logic levels as seen by the most recent step.
    pub fn input_levels(&self) -> &[bool] {
        &self.prev_inputs_logical
    }

    /// Output logic levels computed by the most recent step.
    pub fn output_levels(&self) -> &[bool] {
        &self.prev_outputs_logical
    }

    /// Advances the gate by one tick.
    ///
    /// Inputs are read as logic levels with hysteresis, the transfer function
    /// computes the new output levels, which are turned into nominal voltages,
    /// smoothed by the propagation-delay filter and disturbed by `noise`.
    /// The result becomes the observable output and the history for the next
    /// tick.
    pub fn simulation_step(&mut self, noise: &mut dyn NoiseSource) {
        let inputs_logical = voltage_to_logical(&self.inputs, &self.prev_inputs_logical);

        let outputs_logical = self.logic.outputs_for(
            &inputs_logical,
            &self.prev_inputs_logical,
            &self.prev_outputs_logical,
        );

        let nominal = logical_to_volt(&outputs_logical);
        let mut outputs =
            apply_propagation_delay(&nominal, &self.prev_outputs, self.propagation_delay);
        apply_noise(&mut outputs, noise);

        self.prev_outputs_logical = outputs_logical;
        self.prev_inputs_logical = inputs_logical;
        self.prev_outputs.clone_from(&outputs);
        self.prev_inputs.clone_from(&self.inputs);
        self.outputs = outputs;
    }

    /// Returns all buffers to their power-on state.
    pub fn reset(&mut self) {
        *self = Gate::new(std::mem::take(&mut self.name), self.logic, self.propagation_delay);
    }
}
