//! End-to-end coverage of the basic connect -> subscribe -> publish -> receive
//! loop, driven against a loopback transport with a hand-built broker stub.

mod common;

use mqtt_client::{Client, ClientConfig, ConnectOptions, Message, PublishOptions, QoS, SubscriptionOptions, TopicFilter, TopicName};

#[tokio::test]
async fn connect_then_disconnect_round_trip() {
    let (transport, mut broker) = common::pair();
    let client = Client::new(transport, ClientConfig::default());

    let connect_task = tokio::spawn({
        let client = client.clone();
        async move { client.connect(ConnectOptions::default()).await }
    });

    let (packet_type, _flags, _body) = broker.recv_frame().await;
    assert_eq!(packet_type, common::CONNECT);
    broker.send(&common::connack(false, 0x00)).await;

    connect_task.await.unwrap().unwrap();
    assert!(client.is_connected());

    client.disconnect(Default::default()).await.unwrap();
    let (packet_type, _flags, _body) = broker.recv_frame().await;
    assert_eq!(packet_type, common::DISCONNECT);
    assert!(!client.is_connected());
}

#[tokio::test]
async fn subscribe_then_receive_matching_publish() {
    let (transport, mut broker) = common::pair();
    let client = Client::new(transport, ClientConfig::default());

    let connect_task = {
        let client = client.clone();
        tokio::spawn(async move { client.connect(ConnectOptions::default()).await })
    };
    broker.recv_frame().await;
    broker.send(&common::connack(false, 0x00)).await;
    connect_task.await.unwrap().unwrap();

    let filter = TopicFilter::new("sport/tennis").unwrap();
    let subscribe_task = {
        let client = client.clone();
        let filter = filter.clone();
        tokio::spawn(async move { client.subscribe(filter, SubscriptionOptions::new(QoS::AtLeastOnce)).await })
    };
    let (packet_type, flags, body) = broker.recv_frame().await;
    assert_eq!(packet_type, common::SUBSCRIBE);
    assert_eq!(flags, 0b0010);
    let id = common::packet_id_of(&body);
    broker.send(&common::suback(id, &[0x01])).await;

    let mut sub = subscribe_task.await.unwrap().unwrap();
    assert_eq!(sub.state_changed().await, mqtt_client::SubscriptionState::Active(QoS::AtLeastOnce));

    broker.send(&common::publish("sport/tennis", b"5-0", 0, false, false, None)).await;
    let message = sub.recv().await.unwrap();
    assert_eq!(message.topic, TopicName::new("sport/tennis").unwrap());
    assert_eq!(&message.payload[..], b"5-0");
    assert_eq!(message.qos, QoS::AtMostOnce);
}

#[tokio::test]
async fn publish_qos1_completes_on_puback() {
    let (transport, mut broker) = common::pair();
    let client = Client::new(transport, ClientConfig::default());

    let connect_task = {
        let client = client.clone();
        tokio::spawn(async move { client.connect(ConnectOptions::default()).await })
    };
    broker.recv_frame().await;
    broker.send(&common::connack(false, 0x00)).await;
    connect_task.await.unwrap().unwrap();

    let topic = TopicName::new("device/status").unwrap();
    let publish_task = {
        let client = client.clone();
        let message = Message::new(topic, &b"online"[..]);
        tokio::spawn(async move { client.publish(message, PublishOptions::default().with_qos(QoS::AtLeastOnce)).await })
    };

    let (packet_type, flags, body) = broker.recv_frame().await;
    assert_eq!(packet_type, common::PUBLISH);
    assert_eq!((flags >> 1) & 0x03, 1);
    let topic_len = u16::from_be_bytes([body[0], body[1]]) as usize;
    let id = common::packet_id_of(&body[2 + topic_len..]);
    broker.send(&common::puback(id)).await;

    publish_task.await.unwrap().unwrap();
}
