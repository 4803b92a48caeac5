mod common;

use common::*;
use jukeshare_server::error::{ResolveError, ValidationError};
use jukeshare_server::scheduler::{start_scheduler, SchedulerConfig, SchedulerHandle};
use jukeshare_server::session::{validate_username, Session, SessionCommand};
use std::sync::Arc;
use std::time::Duration;

#[cfg(test)]
mod tests {
    use super::*;

    fn session_with_handle(
        user: &str,
        player: &Arc<FakePlayer>,
        resolver: MockResolver,
    ) -> (Session, SchedulerHandle) {
        let resolver = Arc::new(resolver);
        let config = SchedulerConfig {
            settle_delay: Duration::ZERO,
            song_timeout: Duration::from_secs(30),
        };
        let (scheduler, _task) = start_scheduler(player.clone(), resolver.clone(), config);
        let session = Session::new(user, scheduler.clone(), resolver).unwrap();
        (session, scheduler)
    }

    fn session_for(user: &str, player: &Arc<FakePlayer>, resolver: MockResolver) -> Session {
        session_with_handle(user, player, resolver).0
    }

    #[test]
    fn test_parse_commands() {
        assert_eq!(
            SessionCommand::parse("queue never gonna give you up"),
            Ok(SessionCommand::Queue("never gonna give you up".to_string()))
        );
        assert_eq!(
            SessionCommand::parse("queue https://youtu.be/dQw4w9WgXcQ\n"),
            Ok(SessionCommand::Queue("https://youtu.be/dQw4w9WgXcQ".to_string()))
        );
        assert_eq!(SessionCommand::parse("remove 2"), Ok(SessionCommand::Remove(2)));
        assert_eq!(SessionCommand::parse("skipme"), Ok(SessionCommand::SkipMe));
        assert_eq!(SessionCommand::parse("volup"), Ok(SessionCommand::VolUp));
        assert_eq!(SessionCommand::parse("voldown"), Ok(SessionCommand::VolDown));
    }

    #[test]
    fn test_parse_rejects_bad_input() {
        assert_eq!(
            SessionCommand::parse("queue"),
            Err(ValidationError::MissingArgument("queue"))
        );
        assert_eq!(
            SessionCommand::parse("queue    "),
            Err(ValidationError::MissingArgument("queue"))
        );
        assert_eq!(
            SessionCommand::parse("remove"),
            Err(ValidationError::MissingArgument("remove"))
        );
        assert_eq!(
            SessionCommand::parse("remove -1"),
            Err(ValidationError::InvalidIndex("-1".to_string()))
        );
        assert_eq!(
            SessionCommand::parse("dance"),
            Err(ValidationError::UnknownCommand("dance".to_string()))
        );
        assert!(SessionCommand::parse("skipme now").is_err());
    }

    #[test]
    fn test_validate_username() {
        assert_eq!(validate_username("alice"), Ok("alice"));
        assert_eq!(validate_username("DJ2000"), Ok("DJ2000"));
        assert!(validate_username("a".repeat(20).as_str()).is_ok());

        let too_long = "a".repeat(21);
        for bad in ["", "a b", "bob!", "élodie", " bob ", "bob\n", too_long.as_str()] {
            assert_eq!(
                validate_username(bad),
                Err(ValidationError::BadUsername(bad.to_string())),
                "{:?} should be rejected",
                bad
            );
        }
    }

    #[tokio::test]
    async fn test_session_rejects_bad_username() {
        let player = FakePlayer::new();
        let (scheduler, _task) =
            start_scheduler(player, Arc::new(echo_resolver()), SchedulerConfig::default());
        assert!(Session::new("no spaces", scheduler.clone(), Arc::new(echo_resolver())).is_err());
        // padding is not stripped before the name is checked
        assert!(Session::new(" bob ", scheduler.clone(), Arc::new(echo_resolver())).is_err());
        assert!(Session::new("bob", scheduler, Arc::new(echo_resolver())).is_ok());
    }

    #[test_log::test(tokio::test)]
    async fn test_queue_resolves_and_appends() {
        let player = FakePlayer::new();
        let session = session_for("alice", &player, echo_resolver());

        assert_eq!(session.handle("queue some song").await, None);
        player.wait_for_adds(1).await;
        assert_eq!(
            player.added(),
            vec!["stream:https://example.com/some song".to_string()]
        );
    }

    #[test_log::test(tokio::test)]
    async fn test_queue_failure_is_reported_to_the_user() {
        let player = FakePlayer::new();
        let mut resolver = MockResolver::new();
        resolver
            .expect_song_info()
            .returning(|query| Err(ResolveError::NoResult(query.to_string())));
        let session = session_for("alice", &player, resolver);

        let reply = session.handle("queue nothing here").await.unwrap();
        assert!(reply.contains("nothing here"), "{}", reply);
        assert!(player.added().is_empty());
    }

    #[test_log::test(tokio::test)]
    async fn test_invalid_commands_are_ignored() {
        let player = FakePlayer::new();
        let session = session_for("alice", &player, MockResolver::new());

        assert_eq!(session.handle("dance").await, None);
        assert_eq!(session.handle("remove x").await, None);
        assert_eq!(session.handle("volup").await, None);
    }

    #[test_log::test(tokio::test)]
    async fn test_remove_only_touches_own_queue() {
        let player = FakePlayer::new();
        let (alice, scheduler) = session_with_handle("alice", &player, echo_resolver());
        let bob = Session::new("bob", scheduler.clone(), Arc::new(echo_resolver())).unwrap();

        for title in ["a1", "a2", "a3"] {
            alice.handle(&format!("queue {}", title)).await;
        }
        bob.handle("queue b1").await;

        // a1 is playing, so a2 is at index 0
        alice.handle("remove 0").await;
        bob.handle("remove 5").await;

        let snapshot = scheduler.snapshot().await.unwrap();
        let queued: Vec<(&str, Vec<&str>)> = snapshot
            .queues
            .iter()
            .map(|q| (q.user.as_str(), q.songs.iter().map(|s| s.title.as_str()).collect()))
            .collect();
        assert_eq!(queued, vec![("bob", vec!["b1"]), ("alice", vec!["a3"])]);
    }

    #[test_log::test(tokio::test)]
    async fn test_skipme_reports_backend_failures() {
        let player = FakePlayer::new();
        let session = session_for("alice", &player, echo_resolver());

        assert_eq!(session.handle("skipme").await, None);
        assert_eq!(player.skips(), 1);

        player.set_fail_skips(true);
        let reply = session.handle("skipme").await.unwrap();
        assert!(reply.starts_with("could not skip"), "{}", reply);
    }
}
