use dlg_core::{DialogueOutput, PresentedKind};

use crate::{json_string, BoundaryChoice, BoundaryEvent, BoundaryResult};

pub(crate) fn boundary_from_output(output: &DialogueOutput) -> BoundaryResult {
    match output {
        DialogueOutput::Frame { frame } => BoundaryResult {
            event: BoundaryEvent::Frame,
            path: Some(frame.path()),
            speaker: frame.speaker.clone(),
            text: Some(frame.text.clone()),
            next_text: (frame.kind != PresentedKind::Choice).then(|| frame.next_text.clone()),
            choices: frame
                .choices
                .iter()
                .map(|choice| BoundaryChoice {
                    index: choice.index,
                    text: choice.text.clone(),
                    locked: choice.locked,
                })
                .collect(),
            timer_seconds: frame.timer_seconds,
            close_reason: None,
        },
        DialogueOutput::Closed { reason } => BoundaryResult {
            event: BoundaryEvent::Closed,
            path: None,
            speaker: None,
            text: None,
            next_text: None,
            choices: Vec::new(),
            timer_seconds: None,
            close_reason: Some(reason.clone()),
        },
    }
}

pub(crate) fn emit_boundary(boundary: BoundaryResult, state_out: Option<String>) {
    println!("RESULT:OK");
    match boundary.event {
        BoundaryEvent::Frame => println!("EVENT:FRAME"),
        BoundaryEvent::Closed => println!("EVENT:CLOSED"),
    }

    if let Some(path) = boundary.path {
        println!("FRAME:{}", path);
    }
    if let Some(speaker) = boundary.speaker {
        println!("SPEAKER_JSON:{}", json_string(&speaker));
    }
    if let Some(text) = boundary.text {
        println!("TEXT_JSON:{}", json_string(&text));
    }
    for choice in boundary.choices {
        let tag = if choice.locked { "CHOICE_LOCKED" } else { "CHOICE" };
        println!("{}:{}|{}", tag, choice.index, json_string(&choice.text));
    }
    if let Some(next_text) = boundary.next_text {
        println!("NEXT_JSON:{}", json_string(&next_text));
    }
    if let Some(seconds) = boundary.timer_seconds {
        println!("TIMER:{}", seconds);
    }
    if let Some(reason) = boundary.close_reason {
        match serde_json::to_string(&reason) {
            Ok(json) => println!("CLOSE_JSON:{}", json),
            Err(error) => log::warn!("[cli] close reason not serializable: {}", error),
        }
    }

    println!(
        "STATE_OUT:{}",
        state_out.unwrap_or_else(|| "NONE".to_string())
    );
}
