use cardcraft_core::{
    Flashcard, FlashcardProposal, FlowError, GenerationFlow, NewFlashcard, SaveState, Stage,
    UsageStatus,
};
use uuid::Uuid;

fn proposals(n: usize) -> Vec<FlashcardProposal> {
    (0..n)
        .map(|i| FlashcardProposal {
            front: format!("q{i}"),
            back: format!("a{i}"),
        })
        .collect()
}

fn usage() -> UsageStatus {
    UsageStatus {
        used_today: 3,
        daily_limit: 100,
    }
}

/// A flow advanced to verification with `n` fresh drafts.
fn verification_flow(n: usize) -> GenerationFlow {
    let mut flow = GenerationFlow::new();
    flow.select_deck(Uuid::new_v4()).unwrap();
    flow.proposals_ready(proposals(n), usage()).unwrap();
    flow
}

fn saved_rows(flow: &GenerationFlow, payloads: &[NewFlashcard]) -> Vec<Flashcard> {
    let user = Uuid::new_v4();
    let deck = flow.deck().unwrap();
    payloads
        .iter()
        .map(|p| Flashcard::create(user, deck, p))
        .collect()
}

#[test]
fn walks_forward_through_the_stages() {
    let mut flow = GenerationFlow::new();
    assert_eq!(flow.stage(), Stage::DeckSelection);

    let deck = Uuid::new_v4();
    flow.select_deck(deck).unwrap();
    assert_eq!(flow.stage(), Stage::Generator);
    assert_eq!(flow.deck(), Some(deck));

    flow.proposals_ready(proposals(3), usage()).unwrap();
    assert_eq!(flow.stage(), Stage::Verification);
    assert_eq!(flow.drafts().len(), 3);
    assert_eq!(flow.drafts()[0].front, "q0");
    assert_eq!(flow.drafts()[2].back, "a2");
    assert_eq!(flow.usage(), Some(usage()));
}

#[test]
fn stage_guards_reject_out_of_order_transitions() {
    let mut flow = GenerationFlow::new();
    assert_eq!(
        flow.proposals_ready(proposals(1), usage()),
        Err(FlowError::WrongStage(Stage::DeckSelection))
    );

    flow.select_deck(Uuid::new_v4()).unwrap();
    assert_eq!(
        flow.select_deck(Uuid::new_v4()),
        Err(FlowError::WrongStage(Stage::Generator))
    );
}

#[test]
fn cancel_steps_back_one_stage_at_a_time() {
    let mut flow = verification_flow(2);

    flow.cancel();
    assert_eq!(flow.stage(), Stage::Generator);
    assert!(flow.drafts().is_empty());
    assert!(flow.deck().is_some());

    flow.cancel();
    assert_eq!(flow.stage(), Stage::DeckSelection);
    assert!(flow.deck().is_none());

    // nowhere further back to go
    flow.cancel();
    assert_eq!(flow.stage(), Stage::DeckSelection);
}

#[test]
fn editing_marks_a_draft_edited_and_never_unmarks_it() {
    let mut flow = verification_flow(1);
    let key = flow.drafts()[0].key;

    // typing the identical value is not an edit
    flow.edit_front(key, "q0").unwrap();
    assert!(!flow.drafts()[0].edited);

    flow.edit_front(key, "q0 (reworded)").unwrap();
    assert!(flow.drafts()[0].edited);

    // reverting to the original text does not clear the flag
    flow.edit_front(key, "q0").unwrap();
    assert!(flow.drafts()[0].edited);
    assert!(!flow.drafts()[0].ai_accepted());
}

#[test]
fn removing_a_draft_leaves_no_trace() {
    let mut flow = verification_flow(3);
    let key = flow.drafts()[1].key;

    flow.remove_draft(key).unwrap();
    assert_eq!(flow.drafts().len(), 2);
    assert!(flow.drafts().iter().all(|d| d.key != key));
    assert_eq!(flow.remove_draft(key), Err(FlowError::UnknownDraft));
}

#[test]
fn single_save_disables_its_own_controls_while_in_flight() {
    let mut flow = verification_flow(2);
    let key = flow.drafts()[0].key;

    let payload = flow.begin_save(key).unwrap();
    assert!(payload.ai_generated);
    assert_eq!(payload.ai_accepted, Some(true));
    assert_eq!(flow.drafts()[0].save_state, SaveState::Saving);

    assert_eq!(flow.begin_save(key), Err(FlowError::SaveInFlight));
    assert_eq!(flow.edit_front(key, "x"), Err(FlowError::SaveInFlight));
    assert_eq!(flow.remove_draft(key), Err(FlowError::SaveInFlight));

    // the sibling draft is unaffected
    let other = flow.drafts()[1].key;
    flow.edit_back(other, "new answer").unwrap();

    flow.complete_save(key).unwrap();
    assert_eq!(flow.drafts()[0].save_state, SaveState::Saved);
    assert_eq!(flow.begin_save(key), Err(FlowError::AlreadySaved));
    assert_eq!(flow.edit_front(key, "x"), Err(FlowError::AlreadySaved));
}

#[test]
fn failed_single_save_is_retryable() {
    let mut flow = verification_flow(1);
    let key = flow.drafts()[0].key;

    flow.begin_save(key).unwrap();
    flow.fail_save(key).unwrap();
    assert_eq!(flow.drafts()[0].save_state, SaveState::Error);

    // retry goes back through the same gate
    let payload = flow.begin_save(key).unwrap();
    assert_eq!(payload.front, "q0");
}

#[test]
fn edited_saves_carry_ai_accepted_false() {
    let mut flow = verification_flow(1);
    let key = flow.drafts()[0].key;
    flow.edit_back(key, "my own wording").unwrap();

    let payload = flow.begin_save(key).unwrap();
    assert_eq!(payload.ai_accepted, Some(false));
    assert_eq!(payload.back, "my own wording");
}

#[test]
fn batch_skips_saved_drafts_and_preserves_order() {
    let mut flow = verification_flow(3);
    let keys: Vec<u64> = flow.drafts().iter().map(|d| d.key).collect();

    // save the first individually, edit the second
    flow.begin_save(keys[0]).unwrap();
    flow.complete_save(keys[0]).unwrap();
    flow.edit_front(keys[1], "q1 edited").unwrap();

    let payloads = flow.begin_batch().unwrap();
    assert_eq!(payloads.len(), 2);
    assert_eq!(payloads[0].front, "q1 edited");
    assert_eq!(payloads[0].ai_accepted, Some(false));
    assert_eq!(payloads[1].front, "q2");
    assert_eq!(payloads[1].ai_accepted, Some(true));
}

#[test]
fn batch_is_refused_while_a_single_save_is_in_flight() {
    let mut flow = verification_flow(2);
    let key = flow.drafts()[0].key;
    flow.begin_save(key).unwrap();
    assert_eq!(flow.begin_batch(), Err(FlowError::SaveInFlight));
}

#[test]
fn batch_with_nothing_left_is_an_error() {
    let mut flow = verification_flow(1);
    let key = flow.drafts()[0].key;
    flow.begin_save(key).unwrap();
    flow.complete_save(key).unwrap();
    assert_eq!(flow.begin_batch(), Err(FlowError::NothingToSave));
}

#[test]
fn failed_batch_marks_nothing_saved() {
    let mut flow = verification_flow(3);
    flow.begin_batch().unwrap();
    flow.fail_batch().unwrap();
    assert!(flow
        .drafts()
        .iter()
        .all(|d| d.save_state == SaveState::Idle));
    assert_eq!(flow.created().len(), 0);

    // the whole batch can be retried
    assert_eq!(flow.begin_batch().unwrap().len(), 3);
}

#[test]
fn successful_batch_flows_into_success() {
    let mut flow = verification_flow(2);
    let payloads = flow.begin_batch().unwrap();
    let rows = saved_rows(&flow, &payloads);

    flow.complete_batch(rows).unwrap();
    assert!(flow
        .drafts()
        .iter()
        .all(|d| d.save_state == SaveState::Saved));
    // still in verification until the caller has shown the saved state
    assert_eq!(flow.stage(), Stage::Verification);

    flow.finish().unwrap();
    assert_eq!(flow.stage(), Stage::Success);
    assert_eq!(flow.created().len(), 2);
}

#[test]
fn generate_more_keeps_the_deck() {
    let mut flow = verification_flow(1);
    let deck = flow.deck();
    let payloads = flow.begin_batch().unwrap();
    let rows = saved_rows(&flow, &payloads);
    flow.complete_batch(rows).unwrap();
    flow.finish().unwrap();

    flow.generate_more().unwrap();
    assert_eq!(flow.stage(), Stage::Generator);
    assert_eq!(flow.deck(), deck);
    assert!(flow.drafts().is_empty());
    assert!(flow.created().is_empty());
}

#[test]
fn start_over_resets_everything() {
    let mut flow = verification_flow(2);
    flow.start_over();
    assert_eq!(flow.stage(), Stage::DeckSelection);
    assert!(flow.deck().is_none());
    assert!(flow.drafts().is_empty());
    assert!(flow.usage().is_none());
}
