//! End-to-end governance scenario and concurrency checks

use assert_matches::assert_matches;
use faction_core::{ActorId, FactionError, GovernanceConfig, Permission, PermissionSet};
use faction_governance::{Command, GovernanceService, Response};
use faction_territory::{CellPos, Occupant};
use std::sync::Arc;

#[test]
fn red_faction_scenario() {
    let service = GovernanceService::new(GovernanceConfig::default());
    let a = ActorId::new();
    let b = ActorId::new();
    let c = ActorId::new();

    // A founds Red and becomes Owner
    service
        .handle(
            a,
            Command::Create {
                name: "Red".to_string(),
                description: "the red banner".to_string(),
            },
        )
        .unwrap();

    // A creates grade Captain (priority 1, invite) and promotes B to it
    service
        .handle(
            a,
            Command::SetGrade {
                name: "Captain".to_string(),
                priority: 1,
                permissions: [Permission::Invite].into_iter().collect::<PermissionSet>(),
            },
        )
        .unwrap();
    service
        .handle(a, Command::Invite { target: b })
        .unwrap();
    service
        .handle(
            b,
            Command::Join {
                faction: "Red".to_string(),
            },
        )
        .unwrap();
    service
        .handle(
            a,
            Command::Promote {
                target: b,
                grade: "Captain".to_string(),
            },
        )
        .unwrap();

    // B may invite C
    let response = service.handle(b, Command::Invite { target: c }).unwrap();
    assert_eq!(
        response,
        Response::Invited {
            faction: "Red".to_string(),
            target: c,
        }
    );

    // B (priority 1) may not kick A (Owner, priority 0)
    assert_matches!(
        service.handle(b, Command::Kick { target: a }),
        Err(FactionError::Authorization { .. })
    );

    // A (Owner) kicks B
    service.handle(a, Command::Kick { target: b }).unwrap();
    assert!(service.faction_of(&b).is_none());

    // Red claims a cell; a second faction cannot take it
    let cell = CellPos::new(0, 5, 5);
    service.handle(a, Command::Claim { cell }).unwrap();
    assert_eq!(
        service.owner_of(cell),
        Some(Occupant::Faction {
            faction: "Red".to_string()
        })
    );

    let d = ActorId::new();
    service
        .handle(
            d,
            Command::Create {
                name: "Blue".to_string(),
                description: String::new(),
            },
        )
        .unwrap();
    assert_matches!(
        service.handle(d, Command::Claim { cell }),
        Err(FactionError::StateConflict { .. })
    );
}

#[test]
fn concurrent_claims_yield_one_success() {
    let service = Arc::new(GovernanceService::new(GovernanceConfig::default()));
    let founders: Vec<ActorId> = (0..8).map(|_| ActorId::new()).collect();
    for (i, founder) in founders.iter().enumerate() {
        service
            .handle(
                *founder,
                Command::Create {
                    name: format!("Faction{i}"),
                    description: String::new(),
                },
            )
            .unwrap();
    }

    let cell = CellPos::new(0, 3, 3);
    let handles: Vec<_> = founders
        .iter()
        .map(|founder| {
            let service = service.clone();
            let founder = *founder;
            std::thread::spawn(move || service.handle(founder, Command::Claim { cell }))
        })
        .collect();

    let results: Vec<_> = handles
        .into_iter()
        .map(|handle| handle.join().expect("claim thread panicked"))
        .collect();

    let successes = results.iter().filter(|result| result.is_ok()).count();
    assert_eq!(successes, 1);
    for result in results.iter().filter(|result| result.is_err()) {
        assert_matches!(result, Err(FactionError::StateConflict { .. }));
    }

    // Exactly one faction's aggregate recorded the claim
    let owner = service.owner_of(cell).expect("cell should be owned");
    let Occupant::Faction { faction } = owner else {
        panic!("cell should be faction-owned");
    };
    let recorded: usize = (0..8)
        .filter(|i| {
            service
                .info(&format!("Faction{i}"))
                .map(|info| info.claim_count)
                .unwrap_or(0)
                > 0
        })
        .count();
    assert_eq!(recorded, 1);
    assert!(service.info(&faction).unwrap().claim_count == 1);
}

#[test]
fn disband_racing_claims_leaves_no_orphan_cells() {
    let service = Arc::new(GovernanceService::new(GovernanceConfig::default()));
    let founder = ActorId::new();
    service
        .handle(
            founder,
            Command::Create {
                name: "Red".to_string(),
                description: String::new(),
            },
        )
        .unwrap();

    // Claim distinct cells until the disband on the main thread kicks in
    let claimer = {
        let service = service.clone();
        std::thread::spawn(move || {
            for x in 0..10_000 {
                let claim = service.handle(founder, Command::Claim { cell: CellPos::new(0, x, 0) });
                if claim.is_err() {
                    break;
                }
            }
        })
    };

    service.handle(founder, Command::Disband).unwrap();
    claimer.join().expect("claim thread panicked");

    // Every cell the racing claimer won was released with the faction
    assert!(service.territory().snapshot().is_empty());
    assert!(service.faction_names().is_empty());
}
