//! Packet identifiers assigned to concurrent QoS 1 publishes are distinct,
//! complementing the full 65535-wraparound coverage already unit-tested in
//! `pid_allocator.rs`.

mod common;

use std::collections::HashSet;

use mqtt_client::{Client, ClientConfig, ConnectOptions, Message, PublishOptions, QoS, TopicName};

#[tokio::test]
async fn concurrent_qos1_publishes_get_distinct_packet_ids() {
    let (transport, mut broker) = common::pair();
    let client = Client::new(transport, ClientConfig::default());

    let connect_task = {
        let client = client.clone();
        tokio::spawn(async move { client.connect(ConnectOptions::default()).await })
    };
    broker.recv_frame().await;
    broker.send(&common::connack(false, 0x00)).await;
    connect_task.await.unwrap().unwrap();

    let topic = TopicName::new("sensors/reading").unwrap();
    let mut publish_tasks = Vec::new();
    for i in 0..3u8 {
        let client = client.clone();
        let message = Message::new(topic.clone(), vec![i]);
        publish_tasks.push(tokio::spawn(async move {
            client.publish(message, PublishOptions::default().with_qos(QoS::AtLeastOnce)).await
        }));
    }

    let mut ids = HashSet::new();
    for _ in 0..3 {
        let (packet_type, _flags, body) = broker.recv_frame().await;
        assert_eq!(packet_type, common::PUBLISH);
        let topic_len = u16::from_be_bytes([body[0], body[1]]) as usize;
        let id = common::packet_id_of(&body[2 + topic_len..]);
        broker.send(&common::puback(id)).await;
        ids.insert(id);
    }

    assert_eq!(ids, HashSet::from([1, 2, 3]));
    for task in publish_tasks {
        task.await.unwrap().unwrap();
    }
}
