use crate::common::ComponentId;
use crate::domains::components::models::StepSettings;
use crate::domains::fictions::events::FictionEvent;

/// Events for step flags that turned on between `previous` and `current`.
pub fn settings_change_events(
    component_id: ComponentId,
    previous: &StepSettings,
    current: &StepSettings,
) -> Vec<FictionEvent> {
    let mut events = Vec::new();

    if !previous.creation_enabled && current.creation_enabled {
        events.push(FictionEvent::CreationEnabled { component_id });
    }
    if !previous.voting_enabled() && current.voting_enabled() {
        events.push(FictionEvent::VotingEnabled { component_id });
    }
    if !previous.endorsing_enabled() && current.endorsing_enabled() {
        events.push(FictionEvent::EndorsingEnabled { component_id });
    }

    events
}
