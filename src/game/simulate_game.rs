use crate::game::deck::Deck;
use crate::game::player::Player;
use crate::recording::GameRecord;
use crate::{MathematicoError, Result};
use rand::prelude::*;

/// Plays one full game: 25 cards drawn from a shuffled deck, each placed by `player`.
pub fn play_game(player: &mut dyn Player, game_id: String, rng: &mut StdRng) -> Result<GameRecord> {
    player.reset();
    let mut record = GameRecord::new(game_id, player.player_type());
    let mut deck = Deck::full();

    while !player.board().is_full() {
        let card = deck
            .sample(rng)
            .ok_or_else(|| MathematicoError::InvalidState("deck exhausted".to_string()))?;
        deck.remove(card)?;

        let before = *player.board();
        let position = player.play(card)?;
        record.record_move(&before, card, position, player.last_evaluation());
    }

    record.finalize(player.board());
    Ok(record)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::player::RandomPlayer;
    use crate::recording::PlayerType;

    #[test]
    fn test_random_game_is_complete() {
        let mut player = RandomPlayer::new(1);
        let mut rng = StdRng::seed_from_u64(99);
        let record = play_game(&mut player, "g1".to_string(), &mut rng).unwrap();

        assert_eq!(record.moves.len(), 25);
        assert_eq!(record.player_type, PlayerType::Random);
        assert_eq!(record.final_score, Some(player.board().score() as i32));
        assert_eq!(record.replay().unwrap(), *player.board());
        for m in &record.moves {
            assert!(m.evaluation.is_none());
        }
    }

    #[test]
    fn test_same_seed_same_cards() {
        let mut rng_a = StdRng::seed_from_u64(4);
        let mut rng_b = StdRng::seed_from_u64(4);
        let a = play_game(&mut RandomPlayer::new(0), "a".to_string(), &mut rng_a).unwrap();
        let b = play_game(&mut RandomPlayer::new(0), "b".to_string(), &mut rng_b).unwrap();
        let cards = |r: &GameRecord| r.moves.iter().map(|m| m.card).collect::<Vec<_>>();
        assert_eq!(cards(&a), cards(&b));
        assert_eq!(a.final_score, b.final_score);
    }
}
