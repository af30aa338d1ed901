//! Built-in dataset served when every syndication source is down.

use crate::types::FeedItem;

struct Classic {
    guid: &'static str,
    text: &'static str,
    date: &'static str,
}

const CLASSICS: &[Classic] = &[
    Classic {
        guid: "classic-1",
        text: "Bitcoin is a bank in cyberspace, run by incorruptible software, \
               offering a global, affordable, simple, & secure savings account \
               to billions of people that don't have the option or desire to \
               run their own hedge fund.",
        date: "2020-08-01 00:00:00",
    },
    Classic {
        guid: "classic-2",
        text: "If you want to know what it's going to do in the next decade, \
               just look at what it did in the prior decade. #Bitcoin",
        date: "2021-02-15 00:00:00",
    },
    Classic {
        guid: "classic-3",
        text: "There are no second best options in the 21st century. Bitcoin \
               is the apex property of the human race.",
        date: "2021-06-10 00:00:00",
    },
    Classic {
        guid: "classic-4",
        text: "Digital gold for digital people in the digital economy.",
        date: "2020-12-20 00:00:00",
    },
    Classic {
        guid: "classic-5",
        text: "The most important thing you can do is upgrade yourself from \
               Fiat to Bitcoin.",
        date: "2021-08-05 00:00:00",
    },
];

pub fn fallback_items() -> Vec<FeedItem> {
    CLASSICS
        .iter()
        .map(|c| FeedItem {
            guid: c.guid.to_string(),
            title: String::new(),
            pub_date: c.date.to_string(),
            link: String::new(),
            author: String::new(),
            description: c.text.to_string(),
        })
        .collect()
}
