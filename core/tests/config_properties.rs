//! Properties of parsed grouping files and tunnel listings.

use std::collections::HashSet;

use kfwd_core::domain::dedupe_forwards;
use kfwd_core::{find_group, find_services_with_prefix, parse, Error, PortForward};

const DOCUMENTS: &[&str] = &[
    "g: { context: prod\n  svc-a,8080,80\n}",
    "\
# team services
dev: {
    context: minikube
    api,8080,80
    api-admin,8081,80;
    db.backend,15432,5432
}

ops_1: {
    grafana , 3000 , 80 ;
    prometheus,9090,9090
}
",
    "a: {\n x,1,1\n}\nb: {\n x,65535,65535\n}\nc-d_e: {\n context: arn:aws:eks:eu-west-1:1:cluster/x\n y,2,3\n}\n",
];

#[test]
fn render_then_parse_is_identity() {
    for text in DOCUMENTS {
        let config = parse(text, None).unwrap();
        let rendered = config.to_string();
        let reparsed = parse(&rendered, Some("rendered")).unwrap();

        assert_eq!(config, reparsed, "round trip changed:\n{}", rendered);
        // Rendering is canonical.
        assert_eq!(rendered, reparsed.to_string());
    }
}

#[test]
fn parsed_groups_have_unique_service_names() {
    for text in DOCUMENTS {
        let config = parse(text, None).unwrap();

        for group in config.iter() {
            let names: HashSet<&str> = group.services.iter().map(|s| s.name.as_str()).collect();
            assert_eq!(names.len(), group.services.len());
            assert!(!group.services.is_empty());
        }
    }
}

#[test]
fn narrower_prefix_selects_a_subset() {
    let config = parse(DOCUMENTS[1], None).unwrap();
    let group = find_group(&config, "dev").unwrap();
    let prefixes = ["", "a", "ap", "api", "api-", "api-admin", "d", "db.", "z"];

    for p1 in prefixes {
        for p2 in prefixes.into_iter().filter(|p2| p2.starts_with(p1)) {
            let wide: HashSet<&str> = find_services_with_prefix(group, Some(p1))
                .map(|s| s.into_iter().map(|s| s.name.as_str()).collect())
                .unwrap_or_default();
            let narrow: HashSet<&str> = find_services_with_prefix(group, Some(p2))
                .map(|s| s.into_iter().map(|s| s.name.as_str()).collect())
                .unwrap_or_default();

            assert!(narrow.is_subset(&wide), "{:?} is not within {:?}", p2, p1);
        }
    }
}

#[test]
fn missing_group_is_always_an_error() {
    for text in DOCUMENTS {
        let config = parse(text, None).unwrap();
        assert!(matches!(
            find_group(&config, "missing"),
            Err(Error::GroupNotFound(_))
        ));
    }
}

#[test]
fn dedupe_is_idempotent_and_never_grows() {
    let snapshots: Vec<Vec<(u32, &str)>> = vec![
        vec![],
        vec![
            (1, "kubectl port-forward service/api 8080:80"),
            (2, "kubectl port-forward service/api 8080:80"),
        ],
        vec![
            (1, "kubectl port-forward service/api 8080:80"),
            (2, "kubectl port-forward service/api 8081:80"),
            (3, "kubectl port-forward service/db 5432:5432"),
        ],
    ];

    for rows in snapshots {
        let forwards: Vec<PortForward> = rows
            .iter()
            .filter_map(|(pid, line)| PortForward::from_command_line(Some(*pid), line))
            .collect();

        let once = dedupe_forwards(&forwards);
        let twice = dedupe_forwards(&once);
        assert_eq!(once, twice);
        assert!(once.len() <= forwards.len());

        let distinct: HashSet<_> = forwards.iter().map(PortForward::key).collect();
        assert_eq!(once.len() == forwards.len(), distinct.len() == forwards.len());
    }
}
