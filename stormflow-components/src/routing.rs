use stormflow_core::{NodeState, RoutingAdvance, RoutingEngine, RoutingMethod, SystemResult};
use uom::si::f64::{Time, VolumeRate};

/// A routing engine that always uses the nominal step and converges.
///
/// Each advance passes every node's accumulated external inflow straight
/// through to its outflow, then clears it. No wave equations are solved;
/// the point is a routing collaborator with correct clock and coupling
/// behavior.
#[derive(Debug, Clone)]
pub struct ConstantStepRouting {
    clock: Time,
    nodes: Vec<NodeState>,
}

impl ConstantStepRouting {
    #[must_use]
    pub fn new(node_count: usize) -> Self {
        Self {
            clock: Time::default(),
            nodes: vec![NodeState::default(); node_count],
        }
    }
}

impl RoutingEngine for ConstantStepRouting {
    fn open(&mut self) -> SystemResult<()> {
        self.clock = Time::default();
        self.nodes.fill(NodeState::default());
        Ok(())
    }

    fn step_length(&mut self, _method: RoutingMethod, nominal: Time) -> Time {
        nominal
    }

    fn execute(&mut self, _method: RoutingMethod, step: Time) -> SystemResult<RoutingAdvance> {
        for node in &mut self.nodes {
            node.outflow = node.inflow;
            node.inflow = VolumeRate::default();
        }
        self.clock = self.clock + step;
        Ok(RoutingAdvance {
            elapsed: self.clock,
            converged: true,
        })
    }

    fn close(&mut self, _method: RoutingMethod) {}

    fn node_state(&self, index: usize) -> Option<NodeState> {
        self.nodes.get(index).copied()
    }

    fn add_node_inflow(&mut self, index: usize, inflow: VolumeRate) -> SystemResult<()> {
        match self.nodes.get_mut(index) {
            Some(node) => {
                node.inflow = node.inflow + inflow;
                Ok(())
            }
            None => Err(format!("no node at index {index}").into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use uom::si::{time::minute, volume_rate::cubic_meter_per_second};

    #[test]
    fn inflows_accumulate_until_the_next_advance() {
        let mut routing = ConstantStepRouting::new(2);
        routing.open().unwrap();

        let unit = VolumeRate::new::<cubic_meter_per_second>(1.0);
        routing.add_node_inflow(0, unit).unwrap();
        routing.add_node_inflow(0, unit).unwrap();

        let advance = routing
            .execute(RoutingMethod::DynamicWave, Time::new::<minute>(5.0))
            .unwrap();
        assert!(advance.converged);
        assert_relative_eq!(advance.elapsed.get::<minute>(), 5.0);

        let node = routing.node_state(0).unwrap();
        assert_relative_eq!(node.outflow.get::<cubic_meter_per_second>(), 2.0);
        assert_relative_eq!(node.inflow.get::<cubic_meter_per_second>(), 0.0);
    }

    #[test]
    fn unknown_nodes_are_reported() {
        let mut routing = ConstantStepRouting::new(1);
        assert!(routing.node_state(3).is_none());
        let unit = VolumeRate::new::<cubic_meter_per_second>(1.0);
        assert!(routing.add_node_inflow(3, unit).is_err());
    }

    #[test]
    fn open_resets_the_clock_for_a_new_run() {
        let mut routing = ConstantStepRouting::new(1);
        routing.open().unwrap();
        routing
            .execute(RoutingMethod::KinematicWave, Time::new::<minute>(10.0))
            .unwrap();
        routing.open().unwrap();
        let advance = routing
            .execute(RoutingMethod::KinematicWave, Time::new::<minute>(10.0))
            .unwrap();
        assert_relative_eq!(advance.elapsed.get::<minute>(), 10.0);
    }
}
