#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use maw_store::{EntityStore, MemoryStore};
    use maw_types::{
        Answer, ButtonId, ConsentPrompt, Participant, ParticipantId, Relationship, RelationshipStatus,
        Role,
    };

    use crate::consent::{ConsentError, ConsentMachine, ConsentOutcome, ConsentRequest};
    use crate::narratives::NarrativeTable;
    use crate::testing::FakeMembers;

    const GUILD: u64 = 900000000000000001;
    const PRED_USER: u64 = 111111111111111111;
    const PREY_USER: u64 = 222222222222222222;
    const STRANGER: u64 = 333333333333333333;

    fn participant(id: u64, user_id: u64, name: &str, role: Role) -> Participant {
        Participant {
            id: ParticipantId(id),
            user_id,
            active: true,
            busy: false,
            name: name.to_string(),
            role,
            description: String::new(),
            gender: "n/a".into(),
            species: "fox".into(),
            weight: 60,
            height: 170,
            whitelist: vec![],
            blacklist: vec![],
            autodigest: false,
        }
    }

    struct Fixture {
        store: Arc<MemoryStore>,
        members: FakeMembers,
        machine: ConsentMachine<MemoryStore>,
        rel: Relationship,
        prompt: String,
    }

    async fn fixture() -> Fixture {
        let store = Arc::new(MemoryStore::new());
        store
            .put_participant(&participant(1, PRED_USER, "Rex", Role::Predator))
            .await
            .unwrap();
        store
            .put_participant(&participant(2, PREY_USER, "Mira", Role::Prey))
            .await
            .unwrap();
        let rel = store
            .insert_relationship(ParticipantId(1), ParticipantId(2))
            .await
            .unwrap();

        let members = FakeMembers::with(&[PRED_USER, PREY_USER]);
        let narratives =
            NarrativeTable::from_json(r#"{"vore": ["{{pred}} swallows {{prey}}."]}"#).unwrap();
        let machine = ConsentMachine::new(store.clone(), Arc::new(members.clone()), Arc::new(narratives));
        let prompt = ConsentPrompt {
            prey_name: "Mira".into(),
            prey_user_id: PREY_USER,
            pred_name: "Rex".into(),
            pred_user_id: PRED_USER,
        }
        .render("you are about to be eaten");

        Fixture {
            store,
            members,
            machine,
            rel,
            prompt,
        }
    }

    impl Fixture {
        async fn answer(&self, responder: u64, button: &ButtonId) -> Result<ConsentOutcome, ConsentError> {
            self.machine
                .answer(ConsentRequest {
                    guild_id: GUILD,
                    responder,
                    button,
                    message: &self.prompt,
                })
                .await
        }

        async fn status(&self) -> Option<RelationshipStatus> {
            self.store
                .relationship(self.rel.id)
                .await
                .unwrap()
                .map(|r| r.status)
        }
    }

    fn legacy(answer: Answer) -> ButtonId {
        ButtonId::new("vore", None, answer)
    }

    // ── Legacy buttons (prompt text) ──────────────────────────────────────────

    #[tokio::test]
    async fn test_wrong_user_is_rejected_without_change() {
        let f = fixture().await;
        let outcome = f.answer(STRANGER, &legacy(Answer::Yes)).await.unwrap();
        assert_eq!(outcome, ConsentOutcome::NotYourChoice);
        assert_eq!(f.status().await, Some(RelationshipStatus::Active));
    }

    #[tokio::test]
    async fn test_yes_resolves_with_narrative() {
        let f = fixture().await;
        let outcome = f.answer(PREY_USER, &legacy(Answer::Yes)).await.unwrap();
        assert_eq!(
            outcome,
            ConsentOutcome::Resolved {
                narrative: "Rex swallows Mira.".into()
            }
        );
        assert_eq!(f.status().await, Some(RelationshipStatus::Resolved));
    }

    #[tokio::test]
    async fn test_no_deletes_row_and_names_both() {
        let f = fixture().await;
        let outcome = f.answer(PREY_USER, &legacy(Answer::No)).await.unwrap();
        let ConsentOutcome::Escaped { narrative } = outcome else {
            panic!("expected escape, got {outcome:?}");
        };
        assert!(narrative.contains("Mira"));
        assert!(narrative.contains("Rex"));
        assert_eq!(f.status().await, None);
    }

    #[tokio::test]
    async fn test_second_answer_degrades_gracefully() {
        let f = fixture().await;
        f.answer(PREY_USER, &legacy(Answer::Yes)).await.unwrap();
        let again = f.answer(PREY_USER, &legacy(Answer::No)).await.unwrap();
        assert_eq!(again, ConsentOutcome::AlreadySettled);
        assert_eq!(f.status().await, Some(RelationshipStatus::Resolved));
    }

    #[tokio::test]
    async fn test_concurrent_answers_apply_once() {
        let f = fixture().await;
        let yes_button = legacy(Answer::Yes);
        let no_button = legacy(Answer::No);
        let (yes, no) = tokio::join!(
            f.answer(PREY_USER, &yes_button),
            f.answer(PREY_USER, &no_button),
        );
        let outcomes = [yes.unwrap(), no.unwrap()];
        let settled = outcomes
            .iter()
            .filter(|o| **o == ConsentOutcome::AlreadySettled)
            .count();
        assert_eq!(settled, 1);
    }

    #[tokio::test]
    async fn test_malformed_prompt_rejected_before_mutation() {
        let mut f = fixture().await;
        f.prompt = "Mira, you are about to be eaten by Rex".into();
        let err = f.answer(PREY_USER, &legacy(Answer::No)).await.unwrap_err();
        assert!(matches!(err, ConsentError::MalformedPrompt(_)));
        assert_eq!(f.status().await, Some(RelationshipStatus::Active));
    }

    #[tokio::test]
    async fn test_unknown_category_rejected_before_mutation() {
        let f = fixture().await;
        let button = ButtonId::new("unbirth", None, Answer::Yes);
        let err = f.answer(PREY_USER, &button).await.unwrap_err();
        assert!(matches!(err, ConsentError::UnknownCategory(c) if c == "unbirth"));
        assert_eq!(f.status().await, Some(RelationshipStatus::Active));
    }

    #[tokio::test]
    async fn test_unknown_category_from_stranger_is_not_their_choice() {
        let f = fixture().await;
        let button = ButtonId::new("unbirth", None, Answer::Yes);
        let outcome = f.answer(STRANGER, &button).await.unwrap();
        assert_eq!(outcome, ConsentOutcome::NotYourChoice);
        assert_eq!(f.status().await, Some(RelationshipStatus::Active));
    }

    #[tokio::test]
    async fn test_unknown_category_no_still_escapes() {
        let f = fixture().await;
        let button = ButtonId::new("unbirth", None, Answer::No);
        let outcome = f.answer(PREY_USER, &button).await.unwrap();
        assert!(matches!(outcome, ConsentOutcome::Escaped { .. }));
        assert_eq!(f.status().await, None);
    }

    #[tokio::test]
    async fn test_reassigned_prey_cannot_be_resolved_from_old_prompt() {
        let f = fixture().await;
        // Same character name, now controlled by another user.
        f.store
            .put_participant(&participant(2, STRANGER, "Mira", Role::Prey))
            .await
            .unwrap();
        let outcome = f.answer(PREY_USER, &legacy(Answer::Yes)).await.unwrap();
        assert_eq!(outcome, ConsentOutcome::Stale);
        assert_eq!(f.status().await, Some(RelationshipStatus::Active));

        let outcome = f.answer(PREY_USER, &legacy(Answer::No)).await.unwrap();
        assert_eq!(outcome, ConsentOutcome::Stale);
        assert_eq!(f.status().await, Some(RelationshipStatus::Active));
    }

    #[tokio::test]
    async fn test_predator_gone_frees_relationship() {
        let f = fixture().await;
        f.members.remove(PRED_USER);
        let outcome = f.answer(PREY_USER, &legacy(Answer::Yes)).await.unwrap();
        assert_eq!(outcome, ConsentOutcome::PredatorGone);
        assert_eq!(f.status().await, Some(RelationshipStatus::Free));
    }

    #[tokio::test]
    async fn test_predator_gone_with_reassigned_prey_is_stale() {
        let f = fixture().await;
        f.members.remove(PRED_USER);
        // The character now belongs to someone else.
        f.store
            .put_participant(&participant(2, STRANGER, "Mira", Role::Prey))
            .await
            .unwrap();
        let outcome = f.answer(PREY_USER, &legacy(Answer::Yes)).await.unwrap();
        assert_eq!(outcome, ConsentOutcome::Stale);
        assert_eq!(f.status().await, Some(RelationshipStatus::Active));
    }

    #[tokio::test]
    async fn test_unknown_prey_name_is_stale() {
        let mut f = fixture().await;
        f.prompt = f.prompt.replace("Mira", "Ghost");
        let outcome = f.answer(PREY_USER, &legacy(Answer::Yes)).await.unwrap();
        assert_eq!(outcome, ConsentOutcome::Stale);
    }

    // ── Structured buttons (relationship id) ──────────────────────────────────

    #[tokio::test]
    async fn test_structured_yes_ignores_prompt_text() {
        let mut f = fixture().await;
        f.prompt = "edited message".into();
        let button = ButtonId::new("vore", Some(f.rel.id), Answer::Yes);
        let outcome = f.answer(PREY_USER, &button).await.unwrap();
        assert!(matches!(outcome, ConsentOutcome::Resolved { .. }));
        assert_eq!(f.status().await, Some(RelationshipStatus::Resolved));
    }

    #[tokio::test]
    async fn test_structured_wrong_user() {
        let f = fixture().await;
        let button = ButtonId::new("vore", Some(f.rel.id), Answer::No);
        let outcome = f.answer(PRED_USER, &button).await.unwrap();
        assert_eq!(outcome, ConsentOutcome::NotYourChoice);
        assert_eq!(f.status().await, Some(RelationshipStatus::Active));
    }

    #[tokio::test]
    async fn test_structured_only_touches_its_row() {
        let f = fixture().await;
        let other = f
            .store
            .insert_relationship(ParticipantId(1), ParticipantId(2))
            .await
            .unwrap();
        let button = ButtonId::new("vore", Some(f.rel.id), Answer::No);
        f.answer(PREY_USER, &button).await.unwrap();
        assert_eq!(f.status().await, None);
        assert_eq!(
            f.store.relationship(other.id).await.unwrap().unwrap().status,
            RelationshipStatus::Active
        );
    }

    #[tokio::test]
    async fn test_structured_missing_row_is_settled() {
        let f = fixture().await;
        let button = ButtonId::new("vore", Some(maw_types::RelationshipId::new()), Answer::Yes);
        let outcome = f.answer(PREY_USER, &button).await.unwrap();
        assert_eq!(outcome, ConsentOutcome::AlreadySettled);
    }

    #[tokio::test]
    async fn test_structured_resolved_row_is_settled() {
        let f = fixture().await;
        let mut rel = f.rel.clone();
        rel.status = RelationshipStatus::Resolved;
        f.store.seed_relationship(rel);
        let button = ButtonId::new("vore", Some(f.rel.id), Answer::No);
        let outcome = f.answer(PREY_USER, &button).await.unwrap();
        assert_eq!(outcome, ConsentOutcome::AlreadySettled);
        assert_eq!(f.status().await, Some(RelationshipStatus::Resolved));
    }
}
